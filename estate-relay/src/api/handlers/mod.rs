pub mod extraction;
pub mod health;
pub mod relay;
