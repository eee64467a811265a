//! Arena integration tests
