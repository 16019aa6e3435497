pub mod fsio;
