//! Lokaler Schluessel-Speicher (Client-seitig)
//!
//! Haelt pro Identitaet genau einen privaten Schluessel fuer die Dauer der
//! Anmeldung – unabhaengig von jeder Server-Session. Angelegt bei der
//! ersten Custody-Uebergabe, deterministisch geloescht beim Logout.
//! Export und Import arbeiten nur mit dem Schluessel als Ganzem; es gibt
//! keine Teil- oder Merge-Semantik.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;

use fluesterpost_core::UserId;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// Erwartete Laenge eines privaten X25519-Schluessels in Bytes
const PRIVATE_KEY_LAENGE: usize = 32;

/// Client-lokaler Speicher fuer private Schluessel
#[derive(Debug, Default)]
pub struct LokalerSchluesselSpeicher {
    /// Genau ein ganzer privater Schluessel pro Besitzer
    eintraege: DashMap<UserId, SecretBytes>,
}

impl LokalerSchluesselSpeicher {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Speichert den privaten Schluessel eines Besitzers
    /// (erste Custody-Uebergabe oder Session-Start)
    pub fn speichern(&self, besitzer: UserId, private_key: SecretBytes) {
        self.eintraege.insert(besitzer, private_key);
        tracing::debug!(user_id = %besitzer, "Privater Schluessel lokal abgelegt");
    }

    /// Gibt den privaten Schluessel eines Besitzers zurueck, falls vorhanden
    pub fn abrufen(&self, besitzer: &UserId) -> Option<SecretBytes> {
        self.eintraege.get(besitzer).map(|entry| entry.clone())
    }

    /// Prueft ob fuer einen Besitzer ein Schluessel vorliegt
    pub fn hat_private_key(&self, besitzer: &UserId) -> bool {
        self.eintraege.contains_key(besitzer)
    }

    /// Loescht den Schluessel eines Besitzers (Logout) – idempotent
    pub fn loeschen(&self, besitzer: &UserId) {
        if self.eintraege.remove(besitzer).is_some() {
            tracing::debug!(user_id = %besitzer, "Privater Schluessel geloescht");
        }
    }

    /// Exportiert den Schluessel als opaken Blob (Backup)
    pub fn exportieren(&self, besitzer: &UserId) -> CryptoResult<String> {
        let eintrag = self.eintraege.get(besitzer).ok_or_else(|| {
            CryptoError::IdentitaetNichtGefunden {
                user_id: besitzer.to_string(),
            }
        })?;
        Ok(STANDARD.encode(eintrag.as_bytes()))
    }

    /// Importiert einen zuvor exportierten Blob
    ///
    /// Der Blob muss strukturell ein privater X25519-Schluessel sein
    /// (Base64, exakt 32 Bytes). Andernfalls schlaegt der Import mit
    /// `UngueltigesSchluesselFormat` fehl und der Speicher bleibt
    /// unveraendert.
    pub fn importieren(&self, besitzer: UserId, blob: &str) -> CryptoResult<()> {
        let raw = STANDARD.decode(blob).map_err(|e| {
            CryptoError::UngueltigesSchluesselFormat(format!("Kein gueltiges Base64: {e}"))
        })?;

        if raw.len() != PRIVATE_KEY_LAENGE {
            return Err(CryptoError::UngueltigesSchluesselFormat(format!(
                "Erwartet {PRIVATE_KEY_LAENGE} Bytes, erhalten {}",
                raw.len()
            )));
        }

        self.eintraege.insert(besitzer, SecretBytes::new(raw));
        tracing::debug!(user_id = %besitzer, "Privater Schluessel importiert");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
