//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Ein asymmetrisches Schluessel-Paar (X25519)
///
/// Wird genau einmal pro Identitaet erzeugt. Der oeffentliche Schluessel
/// wandert ins Verzeichnis, der private Schluessel gehoert dem Client.
#[derive(Debug, Clone)]
pub struct SchluesselPaar {
    /// Privater Schluessel (32 Bytes, wird beim Drop genullt)
    pub private_key: SecretBytes,
    /// Oeffentlicher Schluessel (32 Bytes)
    pub public_key: PublicKey,
}

/// Oeffentlicher X25519-Schluessel (weltlesbar, unveraenderlich nach Ausgabe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub bytes: [u8; 32],
}

impl PublicKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Kodiert den Schluessel als Base64 (Drahtformat)
    pub fn als_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        STANDARD.encode(self.bytes)
    }

    /// Dekodiert einen Schluessel aus Base64
    pub fn aus_base64(s: &str) -> CryptoResult<Self> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let raw = STANDARD.decode(s)?;
        let bytes: [u8; 32] =
            raw.try_into()
                .map_err(|v: Vec<u8>| CryptoError::UngueltigeSchluesselLaenge {
                    erwartet: 32,
                    erhalten: v.len(),
                })?;
        Ok(Self { bytes })
    }
}

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Kopiert den Inhalt in ein 32-Byte-Array (fuer X25519/AES-256)
    pub fn als_array_32(&self) -> CryptoResult<[u8; 32]> {
        self.0
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 32,
                erhalten: self.0.len(),
            })
    }
}

/// Eine kryptografische Nonce (12 Bytes, AES-256-GCM)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce {
    pub bytes: [u8; 12],
}

impl Nonce {
    pub fn new(bytes: [u8; 12]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.bytes
    }

    /// Kodiert die Nonce als Hex (Drahtformat, feste Laenge 24 Zeichen)
    pub fn als_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Dekodiert eine Nonce aus Hex
    pub fn aus_hex(s: &str) -> CryptoResult<Self> {
        let raw = hex::decode(s)?;
        let bytes: [u8; 12] =
            raw.try_into()
                .map_err(|v: Vec<u8>| CryptoError::UngueltigeSchluesselLaenge {
                    erwartet: 12,
                    erhalten: v.len(),
                })?;
        Ok(Self { bytes })
    }
}

/// Verschluesselter Nachrichten-Inhalt (das Ergebnis eines `encrypt_message`)
///
/// `ciphertext`, `wrapped_key`, `nonce` und `auth_tag` bilden eine
/// untrennbare Einheit: bei einem Edit werden immer alle vier zusammen
/// ersetzt, nie einzeln.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerschluesselterInhalt {
    /// Symmetrisch verschluesselter Klartext (ohne Auth-Tag)
    pub ciphertext: Vec<u8>,
    /// Content-Key, asymmetrisch eingewickelt unter dem oeffentlichen
    /// Schluessel des Empfaengers: [ephemeral_pub(32)] + [nonce(12)] + [ct]
    pub wrapped_key: Vec<u8>,
    /// Nonce der symmetrischen Verschluesselung
    pub nonce: Nonce,
    /// Abgetrennter Authentifizierungs-Tag (16 Bytes)
    pub auth_tag: [u8; 16],
}

/// Nachrichten-Inhalt als getaggte Variante
///
/// Eine Nachricht ohne Text (z.B. reines Bild) traegt `Leer` – nie einen
/// Sack optionaler Felder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NachrichtenInhalt {
    /// Kein Text vorhanden
    Leer,
    /// Verschluesselter Text
    Verschluesselt(VerschluesselterInhalt),
}

impl NachrichtenInhalt {
    pub fn ist_leer(&self) -> bool {
        matches!(self, Self::Leer)
    }
}
