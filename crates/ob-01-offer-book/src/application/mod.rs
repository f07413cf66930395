//! Application layer for the Offer Book

pub mod service;

pub use service::OfferBookService;
