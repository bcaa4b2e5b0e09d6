pub mod filters;
pub mod normalization;
