//! Hybride Nachrichten-Verschluesselung (Wrap / Unwrap)
//!
//! Pro Verschluesselungs-Vorgang (Erst-Versand oder Edit) wird ein frischer
//! symmetrischer Content-Key erzeugt. Der Klartext wird mit AES-256-GCM
//! verschluesselt, der Content-Key anschliessend asymmetrisch unter dem
//! oeffentlichen X25519-Schluessel des Empfaengers eingewickelt.
//!
//! ## Format des wrapped_key
//! ```text
//! [ephemeral_pub(32)] [nonce(12)] [ciphertext + auth_tag(16)]
//! ```
//!
//! Nur der passende private Schluessel kann den Content-Key wieder
//! auswickeln; ein fremder privater Schluessel ergibt `SchluesselMismatch`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::e2e::kdf::hkdf_derive;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{NachrichtenInhalt, Nonce, PublicKey, SecretBytes, VerschluesselterInhalt};

/// HKDF-Info fuer das Einwickeln des Content-Keys
const KEY_WRAP_INFO: &[u8] = b"fluesterpost-key-wrap-v1";

/// Laenge des AEAD-Auth-Tags in Bytes
const AUTH_TAG_LAENGE: usize = 16;

/// Fester Platzhalter-Text fuer nicht entschluesselbare Nachrichten
///
/// Korrumpierte oder fremde Nachrichten werden nie als echter Inhalt
/// angezeigt, sondern immer als dieser Sentinel.
pub const ENTSCHLUESSELUNG_PLATZHALTER: &str = "[Nachricht kann nicht entschluesselt werden]";

/// Verschluesselt einen Klartext fuer einen Empfaenger (hybrides Schema)
///
/// 1. Frischen 256-Bit Content-Key und frische 12-Byte Nonce erzeugen
/// 2. Klartext mit AES-256-GCM verschluesseln, Auth-Tag abtrennen
/// 3. Content-Key unter dem oeffentlichen Schluessel des Empfaengers einwickeln
///
/// Leerer Klartext ergibt `NachrichtenInhalt::Leer` (explizite Abkuerzung,
/// kein Fehler).
pub fn encrypt_message(
    klartext: &str,
    empfaenger_public_key: &PublicKey,
) -> CryptoResult<NachrichtenInhalt> {
    if klartext.is_empty() {
        return Ok(NachrichtenInhalt::Leer);
    }

    let content_key = frischer_content_key()?;
    let nonce = frische_nonce()?;

    // Symmetrisch verschluesseln
    let key_array = content_key.als_array_32()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_array));
    let mut ct_mit_tag = cipher
        .encrypt(AesNonce::from_slice(nonce.as_bytes()), klartext.as_bytes())
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    // Auth-Tag abtrennen (AES-GCM haengt ihn an den Ciphertext an)
    if ct_mit_tag.len() < AUTH_TAG_LAENGE {
        return Err(CryptoError::Verschluesselung(
            "Ciphertext kuerzer als Auth-Tag".to_string(),
        ));
    }
    let tag_start = ct_mit_tag.len() - AUTH_TAG_LAENGE;
    let auth_tag: [u8; 16] = ct_mit_tag[tag_start..]
        .try_into()
        .map_err(|_| CryptoError::Verschluesselung("Auth-Tag-Laenge ungueltig".to_string()))?;
    ct_mit_tag.truncate(tag_start);

    // Content-Key asymmetrisch einwickeln
    let wrapped_key = wrap_content_key(&content_key, empfaenger_public_key)?;

    Ok(NachrichtenInhalt::Verschluesselt(VerschluesselterInhalt {
        ciphertext: ct_mit_tag,
        wrapped_key,
        nonce,
        auth_tag,
    }))
}

/// Entschluesselt einen Nachrichten-Inhalt mit dem eigenen privaten Schluessel
///
/// Schlaegt fehl mit:
/// - `SchluesselMismatch` wenn der private Schluessel nicht zum beim
///   Einwickeln verwendeten oeffentlichen Schluessel gehoert
/// - `Entschluesselung` wenn der Auth-Tag nicht verifiziert werden kann
///   (Manipulation) – es wird nie korrumpierter Klartext zurueckgegeben
pub fn decrypt_message(
    inhalt: &NachrichtenInhalt,
    private_key: &SecretBytes,
) -> CryptoResult<String> {
    let verschluesselt = match inhalt {
        NachrichtenInhalt::Leer => return Ok(String::new()),
        NachrichtenInhalt::Verschluesselt(v) => v,
    };

    // Content-Key auswickeln
    let content_key = unwrap_content_key(&verschluesselt.wrapped_key, private_key)?;

    // Ciphertext und Auth-Tag wieder zusammenfuegen
    let mut ct_mit_tag =
        Vec::with_capacity(verschluesselt.ciphertext.len() + AUTH_TAG_LAENGE);
    ct_mit_tag.extend_from_slice(&verschluesselt.ciphertext);
    ct_mit_tag.extend_from_slice(&verschluesselt.auth_tag);

    let key_array = content_key.als_array_32()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_array));
    let klartext_bytes = cipher
        .decrypt(
            AesNonce::from_slice(verschluesselt.nonce.as_bytes()),
            ct_mit_tag.as_slice(),
        )
        .map_err(|_| {
            CryptoError::Entschluesselung(
                "Auth-Tag ungueltig oder Daten manipuliert".to_string(),
            )
        })?;

    String::from_utf8(klartext_bytes)
        .map_err(|e| CryptoError::Entschluesselung(format!("Kein gueltiges UTF-8: {e}")))
}

/// Entschluesselt fuer die Anzeige – degradiert bei Fehlern zum Platzhalter
///
/// Fehlgeschlagene Entschluesselung ist lokal behebbar: die Nachricht
/// bleibt in der History, angezeigt wird der feste Sentinel. Der Fehler
/// wird geloggt, nie als Fault weitergereicht.
pub fn decrypt_or_platzhalter(inhalt: &NachrichtenInhalt, private_key: &SecretBytes) -> String {
    match decrypt_message(inhalt, private_key) {
        Ok(klartext) => klartext,
        Err(e) => {
            tracing::warn!(fehler = %e, "Nachricht nicht entschluesselbar – Platzhalter angezeigt");
            ENTSCHLUESSELUNG_PLATZHALTER.to_string()
        }
    }
}

/// Wickelt einen Content-Key unter dem oeffentlichen X25519-Schluessel
/// eines Empfaengers ein (ECIES-aehnliches Schema)
///
/// 1. Ephemeres X25519-Schluessel-Paar generieren
/// 2. DH mit Empfaenger-Public-Key
/// 3. HKDF-SHA256 -> Wrapping Key
/// 4. AES-256-GCM verschluesseln
fn wrap_content_key(
    content_key: &SecretBytes,
    empfaenger_public_key: &PublicKey,
) -> CryptoResult<Vec<u8>> {
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    let empfaenger_pk = X25519PublicKey::from(*empfaenger_public_key.as_bytes());
    let dh_output = ephemeral_secret.diffie_hellman(&empfaenger_pk);

    let wrapping_key = hkdf_derive(
        dh_output.as_bytes(),
        empfaenger_public_key.as_bytes(),
        KEY_WRAP_INFO,
        32,
    )?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));

    let mut nonce_bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce_bytes), content_key.as_bytes())
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    // Output: [ephemeral_public(32)] + [nonce(12)] + [ciphertext]
    let mut out = Vec::with_capacity(32 + 12 + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(out)
}

/// Wickelt einen Content-Key mit dem eigenen privaten X25519-Schluessel aus
///
/// Ein fremder privater Schluessel laesst die AEAD-Verifikation scheitern –
/// das ist der beobachtbare `SchluesselMismatch`.
fn unwrap_content_key(wrapped: &[u8], private_key: &SecretBytes) -> CryptoResult<SecretBytes> {
    if wrapped.len() < 32 + 12 + AUTH_TAG_LAENGE {
        return Err(CryptoError::SchluesselMismatch);
    }

    let ephemeral_pub_bytes: [u8; 32] = wrapped[0..32]
        .try_into()
        .map_err(|_| CryptoError::SchluesselMismatch)?;
    let nonce_bytes: [u8; 12] = wrapped[32..44]
        .try_into()
        .map_err(|_| CryptoError::SchluesselMismatch)?;
    let ciphertext = &wrapped[44..];

    let secret = StaticSecret::from(private_key.als_array_32()?);
    let ephemeral_pub = X25519PublicKey::from(ephemeral_pub_bytes);
    let dh_output = secret.diffie_hellman(&ephemeral_pub);

    let eigener_pub = X25519PublicKey::from(&secret);
    let wrapping_key = hkdf_derive(
        dh_output.as_bytes(),
        eigener_pub.as_bytes(),
        KEY_WRAP_INFO,
        32,
    )?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));
    let content_key = cipher
        .decrypt(AesNonce::from_slice(&nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::SchluesselMismatch)?;

    if content_key.len() != 32 {
        return Err(CryptoError::SchluesselMismatch);
    }

    Ok(SecretBytes::new(content_key))
}

/// Erzeugt einen frischen 256-Bit Content-Key aus der OS-Zufallsquelle
///
/// Versagt die Zufallsquelle, ist das fatal – es wird nicht wiederholt.
fn frischer_content_key() -> CryptoResult<SecretBytes> {
    let mut key_bytes = vec![0u8; 32];
    OsRng
        .try_fill_bytes(&mut key_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
    Ok(SecretBytes::new(key_bytes))
}

/// Erzeugt eine frische 12-Byte Nonce aus der OS-Zufallsquelle
fn frische_nonce() -> CryptoResult<Nonce> {
    let mut nonce_bytes = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
    Ok(Nonce::new(nonce_bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2e::key_manager::schluessel_paar_generieren;

    #[test]
    fn roundtrip() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("Hallo, Fluesterpost!", &paar.public_key).unwrap();

        let klartext = decrypt_message(&inhalt, &paar.private_key).unwrap();
        assert_eq!(klartext, "Hallo, Fluesterpost!");
    }

    #[test]
    fn leerer_klartext_ergibt_leeren_inhalt() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("", &paar.public_key).unwrap();
        assert!(inhalt.ist_leer());

        let klartext = decrypt_message(&inhalt, &paar.private_key).unwrap();
        assert_eq!(klartext, "");
    }

    #[test]
    fn ciphertext_verraet_klartext_nicht() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("hello", &paar.public_key).unwrap();

        let NachrichtenInhalt::Verschluesselt(v) = inhalt else {
            panic!("Inhalt muss verschluesselt sein");
        };
        assert_ne!(v.ciphertext.as_slice(), b"hello");
    }

    #[test]
    fn zwei_wraps_verwenden_nie_gleiche_keys_oder_nonces() {
        let paar = schluessel_paar_generieren().unwrap();

        let inhalt1 = encrypt_message("gleicher Text", &paar.public_key).unwrap();
        let inhalt2 = encrypt_message("gleicher Text", &paar.public_key).unwrap();

        let (NachrichtenInhalt::Verschluesselt(v1), NachrichtenInhalt::Verschluesselt(v2)) =
            (inhalt1, inhalt2)
        else {
            panic!("Inhalte muessen verschluesselt sein");
        };

        // Frischer Content-Key + frische Nonce pro Vorgang
        assert_ne!(v1.nonce, v2.nonce);
        assert_ne!(v1.wrapped_key, v2.wrapped_key);
        assert_ne!(v1.ciphertext, v2.ciphertext);
    }

    #[test]
    fn fremder_private_key_ergibt_mismatch() {
        let paar_a = schluessel_paar_generieren().unwrap();
        let paar_b = schluessel_paar_generieren().unwrap();

        // Fuer B verschluesselt, mit A's privatem Schluessel versucht
        let inhalt = encrypt_message("geheim", &paar_b.public_key).unwrap();
        let result = decrypt_message(&inhalt, &paar_a.private_key);

        assert!(matches!(result, Err(CryptoError::SchluesselMismatch)));
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("Original-Nachricht", &paar.public_key).unwrap();

        let NachrichtenInhalt::Verschluesselt(mut v) = inhalt else {
            panic!("Inhalt muss verschluesselt sein");
        };
        v.ciphertext[0] ^= 0xFF;

        let result = decrypt_message(
            &NachrichtenInhalt::Verschluesselt(v),
            &paar.private_key,
        );
        assert!(matches!(result, Err(CryptoError::Entschluesselung(_))));
    }

    #[test]
    fn manipulierter_auth_tag_schlaegt_fehl() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("Original-Nachricht", &paar.public_key).unwrap();

        let NachrichtenInhalt::Verschluesselt(mut v) = inhalt else {
            panic!("Inhalt muss verschluesselt sein");
        };
        v.auth_tag[0] ^= 0x01;

        let result = decrypt_message(
            &NachrichtenInhalt::Verschluesselt(v),
            &paar.private_key,
        );
        assert!(matches!(result, Err(CryptoError::Entschluesselung(_))));
    }

    #[test]
    fn zu_kurzer_wrapped_key_ergibt_mismatch() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = NachrichtenInhalt::Verschluesselt(VerschluesselterInhalt {
            ciphertext: vec![1, 2, 3],
            wrapped_key: vec![0u8; 10],
            nonce: Nonce::new([0u8; 12]),
            auth_tag: [0u8; 16],
        });

        let result = decrypt_message(&inhalt, &paar.private_key);
        assert!(matches!(result, Err(CryptoError::SchluesselMismatch)));
    }

    #[test]
    fn platzhalter_bei_fehlschlag() {
        let paar_a = schluessel_paar_generieren().unwrap();
        let paar_b = schluessel_paar_generieren().unwrap();

        let inhalt = encrypt_message("geheim", &paar_b.public_key).unwrap();
        let angezeigt = decrypt_or_platzhalter(&inhalt, &paar_a.private_key);

        assert_eq!(angezeigt, ENTSCHLUESSELUNG_PLATZHALTER);
    }

    #[test]
    fn platzhalter_bei_erfolg_ist_klartext() {
        let paar = schluessel_paar_generieren().unwrap();
        let inhalt = encrypt_message("sichtbar", &paar.public_key).unwrap();

        assert_eq!(
            decrypt_or_platzhalter(&inhalt, &paar.private_key),
            "sichtbar"
        );
    }

    #[test]
    fn unicode_klartext_roundtrip() {
        let paar = schluessel_paar_generieren().unwrap();
        let text = "Grüße aus München 🔐";
        let inhalt = encrypt_message(text, &paar.public_key).unwrap();
        assert_eq!(decrypt_message(&inhalt, &paar.private_key).unwrap(), text);
    }
}
