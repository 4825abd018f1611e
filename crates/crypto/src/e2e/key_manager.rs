//! Identitaets-Schluessel-Verwaltung (Key Manager)
//!
//! Verwaltet die asymmetrischen Schluessel-Paare pro Identitaet:
//! - Generieren bei der Registrierung
//! - Veroeffentlichen des oeffentlichen Schluessels im Verzeichnis
//! - Einmalige Uebergabe des privaten Schluessels an den Client (Custody)
//!
//! ## E2EE-Modell
//! Der Server haelt eine Kopie des privaten Schluessels ausschliesslich
//! verschluesselt unter einem Server-Geheimnis, und verwendet sie nur,
//! um die Custody-Uebergabe beim Session-Start zu reproduzieren. Das
//! Server-Geheimnis entschluesselt niemals Nachrichten-Inhalte – die
//! historische Variante, bei der der Server selbst Inhalte ent- und
//! wieder verschluesselt, bricht die E2E-Garantie und ist hier verworfen.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use fluesterpost_core::UserId;

use crate::e2e::kdf::hkdf_derive;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{PublicKey, SchluesselPaar, SecretBytes};

/// HKDF-Info fuer die Ablage privater Schluessel unter dem Server-Geheimnis
const KEY_AT_REST_INFO: &[u8] = b"fluesterpost-key-at-rest-v1";

/// Generiert ein neues X25519-Schluessel-Paar
///
/// X25519 liegt mit ~128 Bit Sicherheit ueber dem geforderten
/// RSA-2048-Aequivalent. Versagt die OS-Zufallsquelle, ist das fatal
/// und wird nicht wiederholt.
pub fn schluessel_paar_generieren() -> CryptoResult<SchluesselPaar> {
    let mut priv_bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut priv_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    let secret = StaticSecret::from(priv_bytes);
    let public = X25519PublicKey::from(&secret);

    Ok(SchluesselPaar {
        private_key: SecretBytes::new(priv_bytes.to_vec()),
        public_key: PublicKey::new(*public.as_bytes()),
    })
}

/// Verwaltet Identitaets-Schluessel fuer alle Benutzer
///
/// Das oeffentliche Verzeichnis ist weltlesbar; die privaten Schluessel
/// liegen nur verschluesselt unter dem Server-Geheimnis und verlassen
/// den Manager ausschliesslich ueber `private_key_ausgeben`.
pub struct IdentitaetsSchluesselManager {
    /// Oeffentliches Schluessel-Verzeichnis (user_id -> PublicKey)
    verzeichnis: DashMap<UserId, PublicKey>,
    /// Private Schluessel, verschluesselt unter dem Server-Geheimnis
    private_abgelegt: DashMap<UserId, Vec<u8>>,
    /// Server-Geheimnis – nur fuer die Custody-Uebergabe, nie fuer Inhalte
    server_geheimnis: SecretBytes,
}

impl IdentitaetsSchluesselManager {
    /// Erstellt einen neuen Manager mit dem angegebenen Server-Geheimnis
    pub fn neu(server_geheimnis: SecretBytes) -> Self {
        Self {
            verzeichnis: DashMap::new(),
            private_abgelegt: DashMap::new(),
            server_geheimnis,
        }
    }

    /// Erstellt eine vollstaendige Identitaet fuer einen Benutzer
    ///
    /// Generiert das Paar, veroeffentlicht den oeffentlichen Schluessel
    /// und legt den privaten verschluesselt ab. Das zurueckgegebene Paar
    /// ist die Custody-Uebergabe an den Client.
    pub fn identitaet_erstellen(&self, user_id: UserId) -> CryptoResult<SchluesselPaar> {
        let paar = schluessel_paar_generieren()?;

        let abgelegt = self.privaten_schluessel_verschluesseln(&paar.private_key)?;
        self.private_abgelegt.insert(user_id, abgelegt);
        self.veroeffentlichen(user_id, paar.public_key);

        tracing::info!(user_id = %user_id, "Identitaet erstellt und Schluessel veroeffentlicht");
        Ok(paar)
    }

    /// Veroeffentlicht einen oeffentlichen Schluessel im Verzeichnis
    ///
    /// Eine erneute Veroeffentlichung ueberschreibt den alten Schluessel.
    /// Alle Nachrichten, deren Content-Key unter dem alten Schluessel
    /// eingewickelt wurde, sind danach dauerhaft nicht mehr
    /// entschluesselbar – die Gefahr wird geloggt, eine Migration findet
    /// bewusst nicht statt.
    pub fn veroeffentlichen(&self, user_id: UserId, public_key: PublicKey) {
        if let Some(alt) = self.verzeichnis.insert(user_id, public_key) {
            if alt != public_key {
                tracing::warn!(
                    user_id = %user_id,
                    "Oeffentlicher Schluessel ueberschrieben – bestehende Nachrichten \
                     unter dem alten Schluessel sind nicht mehr entschluesselbar"
                );
            }
        }
    }

    /// Gibt den oeffentlichen Schluessel eines Benutzers zurueck
    /// (Verzeichnis-Schnittstelle fuer das Mutations-Protokoll)
    pub fn public_key_abfragen(&self, user_id: &UserId) -> CryptoResult<PublicKey> {
        self.verzeichnis
            .get(user_id)
            .map(|entry| *entry)
            .ok_or_else(|| CryptoError::SchluesselNichtGefunden {
                user_id: user_id.to_string(),
            })
    }

    /// Gibt den privaten Schluessel fuer die Custody-Uebergabe aus
    ///
    /// Wird beim Session-Start aufgerufen, um die einmalige Uebergabe an
    /// den Client zu reproduzieren. Der Schluessel wird dafuer aus der
    /// Ablage entschluesselt – Nachrichten-Inhalte beruehrt dieser Pfad nie.
    pub fn private_key_ausgeben(&self, user_id: &UserId) -> CryptoResult<SecretBytes> {
        let abgelegt = self.private_abgelegt.get(user_id).ok_or_else(|| {
            CryptoError::IdentitaetNichtGefunden {
                user_id: user_id.to_string(),
            }
        })?;

        self.privaten_schluessel_entschluesseln(&abgelegt)
    }

    /// Prueft ob fuer einen Benutzer eine Identitaet hinterlegt ist
    pub fn hat_identitaet(&self, user_id: &UserId) -> bool {
        self.private_abgelegt.contains_key(user_id)
    }

    /// Verschluesselt einen privaten Schluessel fuer die Ablage
    ///
    /// Format: [nonce(12)] + [ciphertext + auth_tag]
    fn privaten_schluessel_verschluesseln(
        &self,
        private_key: &SecretBytes,
    ) -> CryptoResult<Vec<u8>> {
        let ablage_key = self.ablage_schluessel()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&ablage_key));

        let mut nonce_bytes = [0u8; 12];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

        let ciphertext = cipher
            .encrypt(AesNonce::from_slice(&nonce_bytes), private_key.as_bytes())
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        let mut out = Vec::with_capacity(12 + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Entschluesselt einen abgelegten privaten Schluessel
    fn privaten_schluessel_entschluesseln(&self, abgelegt: &[u8]) -> CryptoResult<SecretBytes> {
        if abgelegt.len() < 12 + 16 {
            return Err(CryptoError::Entschluesselung(
                "Abgelegter Schluessel zu kurz".to_string(),
            ));
        }

        let ablage_key = self.ablage_schluessel()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&ablage_key));

        let (nonce_bytes, ciphertext) = abgelegt.split_at(12);
        let private_key = cipher
            .decrypt(AesNonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?;

        Ok(SecretBytes::new(private_key))
    }

    /// Leitet den 32-Byte Ablage-Schluessel aus dem Server-Geheimnis ab
    fn ablage_schluessel(&self) -> CryptoResult<Vec<u8>> {
        hkdf_derive(
            self.server_geheimnis.as_bytes(),
            b"fluesterpost-ablage",
            KEY_AT_REST_INFO,
            32,
        )
    }
}

impl std::fmt::Debug for IdentitaetsSchluesselManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IdentitaetsSchluesselManager {{ identitaeten: {} }}",
            self.private_abgelegt.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> IdentitaetsSchluesselManager {
        IdentitaetsSchluesselManager::neu(SecretBytes::new(vec![42u8; 32]))
    }

    #[test]
    fn schluessel_paar_ist_kryptografisch_gepaart() {
        let paar = schluessel_paar_generieren().unwrap();

        let secret = StaticSecret::from(paar.private_key.als_array_32().unwrap());
        let public = X25519PublicKey::from(&secret);
        assert_eq!(public.as_bytes(), paar.public_key.as_bytes());
    }

    #[test]
    fn zwei_identitaeten_teilen_nie_ein_paar() {
        let paar1 = schluessel_paar_generieren().unwrap();
        let paar2 = schluessel_paar_generieren().unwrap();
        assert_ne!(paar1.public_key, paar2.public_key);
    }

    #[test]
    fn identitaet_erstellen_und_abfragen() {
        let manager = test_manager();
        let user = UserId::new();

        let paar = manager.identitaet_erstellen(user).unwrap();
        assert!(manager.hat_identitaet(&user));

        let veroeffentlicht = manager.public_key_abfragen(&user).unwrap();
        assert_eq!(veroeffentlicht, paar.public_key);
    }

    #[test]
    fn unbekannter_benutzer_ergibt_fehler() {
        let manager = test_manager();
        let result = manager.public_key_abfragen(&UserId::new());
        assert!(matches!(
            result,
            Err(CryptoError::SchluesselNichtGefunden { .. })
        ));
    }

    #[test]
    fn custody_uebergabe_reproduzierbar() {
        let manager = test_manager();
        let user = UserId::new();

        let paar = manager.identitaet_erstellen(user).unwrap();

        // Session-Start: Uebergabe wird aus der Ablage reproduziert
        let ausgegeben = manager.private_key_ausgeben(&user).unwrap();
        assert_eq!(ausgegeben.as_bytes(), paar.private_key.as_bytes());
    }

    #[test]
    fn private_key_ausgeben_ohne_identitaet_fehlschlaegt() {
        let manager = test_manager();
        let result = manager.private_key_ausgeben(&UserId::new());
        assert!(matches!(
            result,
            Err(CryptoError::IdentitaetNichtGefunden { .. })
        ));
    }

    #[test]
    fn ablage_ist_verschluesselt() {
        let manager = test_manager();
        let user = UserId::new();

        let paar = manager.identitaet_erstellen(user).unwrap();

        // Die Ablage darf den privaten Schluessel nie im Klartext enthalten
        let abgelegt = manager.private_abgelegt.get(&user).unwrap().clone();
        let priv_bytes = paar.private_key.as_bytes();
        assert!(!abgelegt
            .windows(priv_bytes.len())
            .any(|fenster| fenster == priv_bytes));
    }

    #[test]
    fn falsches_server_geheimnis_entschluesselt_nicht() {
        let manager = test_manager();
        let user = UserId::new();
        manager.identitaet_erstellen(user).unwrap();

        let abgelegt = manager.private_abgelegt.get(&user).unwrap().clone();

        let fremder_manager =
            IdentitaetsSchluesselManager::neu(SecretBytes::new(vec![7u8; 32]));
        let result = fremder_manager.privaten_schluessel_entschluesseln(&abgelegt);
        assert!(matches!(result, Err(CryptoError::Entschluesselung(_))));
    }

    #[test]
    fn erneute_veroeffentlichung_ueberschreibt() {
        let manager = test_manager();
        let user = UserId::new();

        manager.identitaet_erstellen(user).unwrap();
        let neues_paar = schluessel_paar_generieren().unwrap();

        // Gefahr: alte wrapped keys werden dadurch wertlos (nur geloggt)
        manager.veroeffentlichen(user, neues_paar.public_key);
        assert_eq!(
            manager.public_key_abfragen(&user).unwrap(),
            neues_paar.public_key
        );
    }
}
