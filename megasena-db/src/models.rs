use std::fmt;

use chrono::NaiveDate;

use crate::error::{MegaError, MegaResult};

/// Numéros jouables : 1 à 60.
pub const POOL_SIZE: usize = 60;
/// Numéros tirés par concours.
pub const PICK_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub contest: u32,
    pub date: Option<NaiveDate>,
    /// Toujours triées par ordre croissant.
    pub balls: [u8; PICK_COUNT],
}

impl Draw {
    pub fn new(contest: u32, date: Option<NaiveDate>, balls: &[u8]) -> MegaResult<Self> {
        if contest == 0 {
            return Err(MegaError::Data("concours 0".to_string()));
        }
        let balls = check_numbers(balls).map_err(MegaError::Data)?;
        Ok(Self { contest, date, balls })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.balls.binary_search(&number).is_ok()
    }

    pub fn date_label(&self) -> String {
        match self.date {
            Some(d) => d.format("%d/%m/%Y").to_string(),
            None => "—".to_string(),
        }
    }
}

/// Enregistrement brut tel que fourni par une source externe (CSV, API).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub contest: String,
    pub date: String,
    pub balls: Vec<String>,
}

impl RawRecord {
    pub fn parse(&self) -> MegaResult<Draw> {
        let raw_contest = self.contest.trim();
        let contest = raw_contest
            .parse::<u32>()
            .map_err(|_| MegaError::Data(format!("concours non numérique : '{}'", raw_contest)))?;

        let balls = self
            .balls
            .iter()
            .map(|b| {
                let b = b.trim();
                b.parse::<u8>()
                    .map_err(|_| MegaError::Data(format!("concours {contest} : boule '{b}' illisible")))
            })
            .collect::<MegaResult<Vec<u8>>>()?;

        let date = parse_date(&self.date);
        Draw::new(contest, date, &balls)
            .map_err(|e| match e {
                MegaError::Data(msg) => MegaError::Data(format!("concours {contest} : {msg}")),
                other => other,
            })
    }
}

/// Accepte `JJ/MM/AAAA` (format de l'éditeur) ou `AAAA-MM-JJ`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Vérifie 6 numéros distincts dans 1..=60 et les renvoie triés.
fn check_numbers(numbers: &[u8]) -> Result<[u8; PICK_COUNT], String> {
    if numbers.len() != PICK_COUNT {
        return Err(format!("{} numéros au lieu de {}", numbers.len(), PICK_COUNT));
    }
    let mut sorted = [0u8; PICK_COUNT];
    sorted.copy_from_slice(numbers);
    sorted.sort();

    for &n in &sorted {
        if n < 1 || n as usize > POOL_SIZE {
            return Err(format!("numéro {} hors limites (1-{})", n, POOL_SIZE));
        }
    }
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(format!("numéro en double : {}", w[0]));
    }
    Ok(sorted)
}

/// Grille de 6 numéros distincts, triés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket([u8; PICK_COUNT]);

impl Ticket {
    pub fn new(numbers: &[u8]) -> MegaResult<Self> {
        check_numbers(numbers)
            .map(Ticket)
            .map_err(MegaError::InvalidSelection)
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    /// Nombre de numéros en commun avec un tirage.
    pub fn hits(&self, draw: &Draw) -> usize {
        self.0.iter().filter(|&&n| draw.contains(n)).count()
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| format!("{:02}", n)).collect();
        write!(f, "{}", parts.join(" - "))
    }
}

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub delay: u32,
}

#[derive(Debug, Clone)]
pub struct NumberProbability {
    pub number: u8,
    pub probability: f64,
    pub tag: ProbabilityTag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityTag {
    Hot,
    Cold,
    Normal,
}

impl fmt::Display for ProbabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbabilityTag::Hot => write!(f, "HOT"),
            ProbabilityTag::Cold => write!(f, "COLD"),
            ProbabilityTag::Normal => write!(f, "-"),
        }
    }
}
