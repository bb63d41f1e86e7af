//! Integration tests for mindsync-remote
//!
//! Uses wiremock to simulate the record API and verifies request shapes,
//! response decoding and error classification of the HttpRemoteStore.

mod common;

mod test_account;
mod test_errors;
mod test_records;
