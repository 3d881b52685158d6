use thiserror::Error;

/// Erreurs récupérables du noyau : chargement, statistiques, génération.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MegaError {
    /// Enregistrement malformé. Il est écarté, le chargement continue.
    #[error("Enregistrement invalide : {0}")]
    Data(String),

    #[error("Aucun tirage chargé")]
    EmptyDataset,

    #[error("Poids dégénérés : {0}")]
    DegenerateInput(String),

    #[error("Sélection invalide : {0}")]
    InvalidSelection(String),

    #[error("Paramètre invalide : {0}")]
    InvalidParameter(String),
}

pub type MegaResult<T> = Result<T, MegaError>;
