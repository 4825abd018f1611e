//! Ende-zu-Ende-Verschluesselung
//!
//! - `hybrid` – hybrides Wrap/Unwrap pro Nachricht
//! - `key_manager` – Identitaets-Schluessel und oeffentliches Verzeichnis
//! - `kdf` – HKDF-SHA256 Ableitung

pub mod hybrid;
pub mod kdf;
pub mod key_manager;

pub use hybrid::{
    decrypt_message, decrypt_or_platzhalter, encrypt_message, ENTSCHLUESSELUNG_PLATZHALTER,
};
pub use kdf::hkdf_derive;
pub use key_manager::{schluessel_paar_generieren, IdentitaetsSchluesselManager};
