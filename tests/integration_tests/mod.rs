// Aggregates per-module integration suites
mod _support;
mod query;
