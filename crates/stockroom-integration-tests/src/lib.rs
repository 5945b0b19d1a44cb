//! End-to-end integration tests for Stockroom
//!
//! These tests wire the full pipeline together - correlation id layer,
//! metrics layer, request logging, handlers, service, and store - and
//! verify the instrumentation contracts from the outside: header echo,
//! metric accounting, and span lifecycle.
