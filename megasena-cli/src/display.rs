use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::analysis::backtest::BacktestReport;
use crate::analysis::closing::ClosingWheel;
use crate::analysis::sampler::WeightedDistribution;
use crate::import::ImportResult;
use megasena_db::models::{Draw, NumberProbability, NumberStats, ProbabilityTag, Ticket};
use megasena_db::store::AppendSummary;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn balls_label(balls: &[u8]) -> String {
    balls
        .iter()
        .map(|b| format!("{:02}", b))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros"]);
    for draw in draws {
        table.add_row(vec![
            draw.contest.to_string(),
            draw.date_label(),
            balls_label(&draw.balls),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Déjà en base      : {}", result.already_known);
    println!("  Doublons ignorés  : {}", result.duplicates);
    let errors = result.rejected.len() + result.read_errors;
    if errors > 0 {
        println!("  Erreurs           : {}", errors);
        for rejected in result.rejected.iter().take(5) {
            println!("    ligne {} : {}", rejected.line, rejected.error);
        }
        if result.rejected.len() > 5 {
            println!("    … (RUST_LOG=warn pour le détail)");
        }
    }
}

pub fn display_refresh_summary(summary: &AppendSummary) {
    if summary.appended.is_empty() {
        println!("Base déjà à jour.");
        return;
    }
    println!("Mise à jour : {} nouveau(x) concours", summary.appended.len());
    display_draws(&summary.appended);
}

pub fn display_stats(stats: &[NumberStats], draw_count: usize) {
    println!("\n📊 Statistiques sur {} tirages\n", draw_count);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard"]);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        table.add_row(vec![
            &format!("{:02}", stat.number),
            &stat.frequency.to_string(),
            &stat.delay.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_probabilities(probs: &[NumberProbability], delay_bias: f64) {
    println!("\n🎯 Probabilités (poids du retard = {:.2})\n", delay_bias);

    let mut table = new_table(vec!["Numéro", "Probabilité", "Tag"]);

    let mut sorted = probs.to_vec();
    sorted.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap_or(std::cmp::Ordering::Equal));

    for prob in &sorted {
        let color = match prob.tag {
            ProbabilityTag::Hot => Color::Green,
            ProbabilityTag::Cold => Color::Red,
            ProbabilityTag::Normal => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", prob.number)),
            Cell::new(format!("{:.4}", prob.probability)),
            Cell::new(prob.tag.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_tickets(tickets: &[Ticket], distribution: &WeightedDistribution) {
    println!("\n🎲 Grilles suggérées\n");

    let mut table = new_table(vec!["#", "Grille", "Score"]);
    for (i, ticket) in tickets.iter().enumerate() {
        table.add_row(vec![
            format!("{:02}", i + 1),
            ticket.to_string(),
            format!("{:.4}", distribution.score(ticket)),
        ]);
    }
    println!("{table}");
}

pub fn display_closing(wheel: &ClosingWheel, sample: &[Ticket]) {
    println!(
        "\n📐 Fermeture de {} numéros : {} combinaisons possibles",
        wheel.pool().len(),
        wheel.len()
    );
    println!("   Sélection : {}\n", balls_label(wheel.pool()));

    let mut table = new_table(vec!["Jeu", "Grille"]);
    for (i, ticket) in sample.iter().enumerate() {
        table.add_row(vec![format!("{:02}", i + 1), ticket.to_string()]);
    }
    println!("{table}");
}

pub fn display_backtest(ticket: &Ticket, report: &BacktestReport) {
    println!("\n🔍 Grille {} sur {} tirages\n", ticket, report.draws_checked);

    let mut summary = new_table(vec!["Senas (6)", "Quinas (5)", "Quadras (4)"]);
    summary.add_row(vec![
        report.senas.to_string(),
        report.quinas.to_string(),
        report.quadras.to_string(),
    ]);
    println!("{summary}");

    if !report.has_prize() {
        println!("Cette grille n'aurait jamais gagné (4, 5 ou 6 numéros) dans l'historique.");
        return;
    }

    println!("\nDétail des gains passés :");
    let mut table = new_table(vec!["Concours", "Date", "Numéros communs"]);
    for m in &report.matches {
        let date = m
            .date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "—".to_string());
        let color = if m.hits == 6 { Color::Green } else { Color::White };
        table.add_row(vec![
            Cell::new(m.contest),
            Cell::new(date),
            Cell::new(m.hits).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_footer(latest_contest: Option<u32>) {
    let latest = latest_contest
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!("\nDonnées à jour jusqu'au concours : {latest}");
}
