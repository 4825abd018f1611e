//! Unit-Tests fuer das Chat-Crate

mod speicher_tests;
