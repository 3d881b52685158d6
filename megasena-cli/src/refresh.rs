use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use megasena_db::models::RawRecord;
use megasena_db::store::{AppendSummary, DrawStore};

/// Raison d'un échec de mise à jour. L'appelant la journalise et continue
/// avec les données locales.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Délai dépassé en interrogeant {0}")]
    Timeout(String),

    #[error("Erreur réseau : {0}")]
    Transport(String),

    #[error("Réponse HTTP {status} pour {url}")]
    Status { status: u16, url: String },

    #[error("Réponse illisible : {0}")]
    Parse(String),
}

/// Résultat d'un concours tel que publié par l'API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteDraw {
    #[serde(rename = "numero", alias = "concurso")]
    pub contest: u32,
    #[serde(rename = "dataApuracao", alias = "data", default)]
    pub date: String,
    #[serde(rename = "listaDezenas", alias = "dezenas")]
    pub numbers: Vec<String>,
}

impl From<RemoteDraw> for RawRecord {
    fn from(remote: RemoteDraw) -> Self {
        RawRecord {
            contest: remote.contest.to_string(),
            date: remote.date,
            balls: remote.numbers,
        }
    }
}

pub fn parse_remote_draw(body: &str) -> Result<RemoteDraw, RefreshError> {
    serde_json::from_str(body).map_err(|e| RefreshError::Parse(e.to_string()))
}

pub trait DrawSource {
    fn latest(&self) -> Result<RemoteDraw, RefreshError>;
    fn contest(&self, number: u32) -> Result<RemoteDraw, RefreshError>;
}

/// `GET {base}` : dernier concours ; `GET {base}/{n}` : concours n.
pub struct HttpDrawSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpDrawSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RefreshError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("megasena-cli/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, url: &str) -> Result<RemoteDraw, RefreshError> {
        debug!("GET {url}");
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                RefreshError::Timeout(url.to_string())
            } else {
                RefreshError::Transport(e.to_string())
            }
        };

        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().map_err(classify)?;
        parse_remote_draw(&body)
    }
}

impl DrawSource for HttpDrawSource {
    fn latest(&self) -> Result<RemoteDraw, RefreshError> {
        self.get(&self.base_url)
    }

    fn contest(&self, number: u32) -> Result<RemoteDraw, RefreshError> {
        self.get(&format!("{}/{}", self.base_url, number))
    }
}

/// Concours publiés après `latest_local`, du plus ancien au plus récent,
/// au plus `max_fetch`. Le premier échec interrompt tout le lot.
pub fn fetch_new_records(
    source: &dyn DrawSource,
    latest_local: Option<u32>,
    max_fetch: usize,
) -> Result<Vec<RawRecord>, RefreshError> {
    let latest = source.latest()?;
    let from = latest_local.unwrap_or(0).saturating_add(1);
    if latest.contest < from || max_fetch == 0 {
        debug!("Aucun concours distant après {:?}", latest_local);
        return Ok(Vec::new());
    }

    let cap = u32::try_from(max_fetch - 1).unwrap_or(u32::MAX);
    let to = latest.contest.min(from.saturating_add(cap));
    if to < latest.contest {
        info!("{} concours manquants, seuls {} seront récupérés", latest.contest - from + 1, max_fetch);
    }

    let mut records = Vec::with_capacity((to - from + 1) as usize);
    for number in from..=to {
        let remote = if number == latest.contest {
            latest.clone()
        } else {
            source.contest(number)?
        };
        records.push(RawRecord::from(remote));
    }
    Ok(records)
}

pub fn refresh_store(
    store: &mut DrawStore,
    source: &dyn DrawSource,
    max_fetch: usize,
) -> Result<AppendSummary, RefreshError> {
    let records = fetch_new_records(source, store.latest_contest(), max_fetch)?;
    Ok(store.append(records))
}
