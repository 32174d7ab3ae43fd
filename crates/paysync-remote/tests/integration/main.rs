//! Integration tests for paysync-remote
//!
//! Uses wiremock to simulate the REST table API and verifies request shape,
//! response decoding and error classification of `RestPaymentStore`.

mod common;

mod test_errors;
mod test_store;
