use console::style;
use libcensys_recon::{
    report::{general_info, HostRecord},
    FetchResult, Outcome,
};
use tabled::{settings::Style, Table, Tabled};

pub const BANNER: &str = r#"
=============================================
     censys-recon - Censys Exposure Analyzer
=============================================
"#;

#[derive(Tabled)]
struct InfoRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Details")]
    details: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Service")]
    service: String,
}

fn rounded<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn section(title: String, body: String) -> String {
    format!("{}\n{}\n", style(title).bold().cyan(), body)
}

/// Three tables for a host: general info, statistics, open ports.
pub fn render_host(ip: &str, record: &HostRecord) -> String {
    let general: Vec<InfoRow> = general_info(ip, record)
        .into_iter()
        .map(|(field, details)| InfoRow { field, details })
        .collect();

    let stats: Vec<MetricRow> = record
        .stats()
        .rows()
        .into_iter()
        .map(|(metric, value)| MetricRow { metric, value })
        .collect();

    let mut ports: Vec<PortRow> = record
        .port_listing()
        .into_iter()
        .map(|(port, service)| PortRow { port, service })
        .collect();
    if ports.is_empty() {
        ports.push(PortRow {
            port: "-".to_string(),
            service: "None listed".to_string(),
        });
    }

    let mut out = String::new();
    out.push_str(&section(format!("General Information for {}", ip), rounded(general)));
    out.push_str(&section("Statistics".to_string(), rounded(stats)));
    out.push_str(&section("Open Ports and Services".to_string(), rounded(ports)));
    out
}

/// `input: reason`, with the queried address when it differs from the input.
pub fn error_line(result: &FetchResult) -> Option<String> {
    let Outcome::Failed { error } = &result.outcome else {
        return None;
    };

    let subject = match result.ip.as_deref() {
        Some(ip) if ip != result.input => format!("{} ({})", result.input, ip),
        _ => result.input.clone(),
    };

    let mut line = format!("{}: {}", subject, error);
    if let Some(hint) = error.hint() {
        line.push_str(". ");
        line.push_str(hint);
    }
    Some(line)
}

pub fn render_result(result: &FetchResult) -> String {
    match &result.outcome {
        Outcome::Found { data } => {
            let ip = result.ip.as_deref().unwrap_or(&result.input);
            render_host(ip, data)
        }
        Outcome::Failed { .. } => {
            let line = error_line(result).unwrap_or_default();
            format!("{}\n", style(format!("[!] {}", line)).red())
        }
    }
}
