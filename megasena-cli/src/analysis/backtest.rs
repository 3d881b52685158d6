use chrono::NaiveDate;

use megasena_db::models::Ticket;
use megasena_db::store::DrawStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestMatch {
    pub contest: u32,
    pub date: Option<NaiveDate>,
    pub hits: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktestReport {
    pub draws_checked: usize,
    pub quadras: usize,
    pub quinas: usize,
    pub senas: usize,
    /// Concours avec au moins 4 numéros communs, par concours croissant.
    pub matches: Vec<BacktestMatch>,
}

impl BacktestReport {
    pub fn has_prize(&self) -> bool {
        !self.matches.is_empty()
    }
}

pub fn backtest(store: &DrawStore, ticket: &Ticket) -> BacktestReport {
    let mut report = BacktestReport {
        draws_checked: store.len(),
        ..Default::default()
    };

    // Gains : quadra (4), quina (5), sena (6).
    for draw in store.all_draws() {
        let hits = ticket.hits(draw);
        match hits {
            4 => report.quadras += 1,
            5 => report.quinas += 1,
            6 => report.senas += 1,
            _ => continue,
        }
        report.matches.push(BacktestMatch {
            contest: draw.contest,
            date: draw.date,
            hits,
        });
    }

    report
}
