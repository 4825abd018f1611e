//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    /// Der Empfaenger hat keinen veroeffentlichten Schluessel –
    /// der Versand wird abgebrochen, nichts wird persistiert
    #[error("Empfaenger nicht gefunden: {0}")]
    EmpfaengerNichtGefunden(String),

    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(String),

    /// Edit/Delete durch einen anderen Benutzer als den Verfasser –
    /// abgelehnt ohne jede Zustandsaenderung
    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Speicher-Fehler: {0}")]
    Speicher(String),

    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] fluesterpost_crypto::CryptoError),
}

pub type ChatResult<T> = Result<T, ChatError>;
