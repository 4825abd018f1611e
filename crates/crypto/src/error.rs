//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Zufallsquelle nicht verfuegbar – fatal, wird nie wiederholt
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Auth-Tag ungueltig oder Daten manipuliert – es wird nie
    /// korrumpierter Klartext zurueckgegeben
    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    /// Der private Schluessel passt nicht zum oeffentlichen Schluessel,
    /// unter dem der Content-Key eingewickelt wurde
    #[error("Privater Schluessel passt nicht zum verwendeten oeffentlichen Schluessel")]
    SchluesselMismatch,

    #[error("Ungueltiges Schluessel-Format: {0}")]
    UngueltigesSchluesselFormat(String),

    #[error("Schluessel-Ableitung fehlgeschlagen: {0}")]
    SchluesselAbleitung(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Kein oeffentlicher Schluessel fuer Benutzer {user_id}")]
    SchluesselNichtGefunden { user_id: String },

    #[error("Keine Identitaet fuer Benutzer {user_id} hinterlegt")]
    IdentitaetNichtGefunden { user_id: String },

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Hex-Dekodierung fehlgeschlagen: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
