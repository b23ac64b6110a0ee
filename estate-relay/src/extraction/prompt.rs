//! Fixed instruction sent to the assistant for every uploaded deal document.
//!
//! The prompt does not reference the upload directly: the assistant reaches the
//! document through its file-search tool, which is bound to the request's
//! vector store before the message is posted.

/// Instruction describing the JSON shape the assistant must return.
///
/// # Example
/// ```
/// use estate_relay::extraction::prompt::EXTRACTION_PROMPT;
///
/// assert!(EXTRACTION_PROMPT.contains("\"rent_roll\""));
/// ```
pub const EXTRACTION_PROMPT: &str = r#"You are a commercial real-estate analyst. Use the file search tool to read the attached offering document (offering memorandum, broker package, T-12, rent roll or similar) and extract its financial data.

Return ONLY a single valid JSON object that follows this schema. Do not wrap it in markdown fences and do not add commentary before or after it.

{
  "property_info": {
    "name": "string | null",
    "address": "string | null",
    "city": "string | null",
    "state": "string | null",
    "zip_code": "string | null",
    "property_type": "multifamily | office | retail | industrial | mixed_use | hospitality | self_storage | land | other | null",
    "year_built": "integer | null",
    "year_renovated": "integer | null",
    "total_units": "integer | null",
    "net_rentable_sqft": "number | null",
    "lot_size_acres": "number | null",
    "occupancy_rate": "number between 0 and 1 | null"
  },
  "pricing": {
    "asking_price": "number | null",
    "price_per_unit": "number | null",
    "price_per_sqft": "number | null",
    "offer_deadline": "YYYY-MM-DD | null"
  },
  "financials": {
    "gross_potential_rent": "number | null",
    "vacancy_loss": "number | null",
    "other_income": "number | null",
    "effective_gross_income": "number | null",
    "total_operating_expenses": "number | null",
    "net_operating_income": "number | null",
    "period": "T12 | T3 annualized | pro_forma | year_1 | other | null"
  },
  "rent_roll": [
    {
      "unit": "string",
      "unit_type": "string | null",
      "sqft": "number | null",
      "tenant": "string | null",
      "current_rent": "number | null",
      "market_rent": "number | null",
      "lease_start": "YYYY-MM-DD | null",
      "lease_end": "YYYY-MM-DD | null",
      "status": "occupied | vacant | notice | null"
    }
  ],
  "operating_expenses": {
    "real_estate_taxes": "number | null",
    "insurance": "number | null",
    "utilities": "number | null",
    "repairs_and_maintenance": "number | null",
    "management_fee": "number | null",
    "payroll": "number | null",
    "administrative": "number | null",
    "reserves": "number | null",
    "other": "number | null"
  },
  "returns": {
    "cap_rate": "number between 0 and 1 | null",
    "pro_forma_cap_rate": "number between 0 and 1 | null",
    "cash_on_cash": "number between 0 and 1 | null",
    "irr": "number between 0 and 1 | null",
    "equity_multiple": "number | null",
    "debt_service_coverage_ratio": "number | null",
    "gross_rent_multiplier": "number | null"
  },
  "metadata": {
    "document_type": "string | null",
    "broker": "string | null",
    "as_of_date": "YYYY-MM-DD | null",
    "currency": "ISO 4217 code, default USD",
    "confidence": "number between 0 and 1",
    "notes": ["string"]
  }
}

Rules:
- Use null when a value is not stated in the document; never invent numbers.
- Amounts are annual figures in the document's currency, as plain numbers without symbols or thousands separators.
- Percentages are decimals (5.25% becomes 0.0525).
- Include every unit listed in the rent roll; use an empty array when the document has none.
- When the document shows both actual and pro forma figures, put actuals in "financials" and record the pro forma cap rate in "returns".
- Put assumptions, conflicts between sections, and anything you could not read into "metadata.notes"."#;
