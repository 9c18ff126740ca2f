//! Result set rendering for the interactive surface

use crate::executor::ResultSet;
use prettytable::{Cell, Row, Table};

/// Render a result set as an ASCII table, header row first
pub fn render_result_table(set: &ResultSet) -> String {
    let mut table = Table::new();

    table.add_row(Row::new(
        set.columns.iter().map(|name| Cell::new(name)).collect(),
    ));

    for row in &set.rows {
        table.add_row(Row::new(row.iter().map(|value| Cell::new(value)).collect()));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_includes_headers_and_values() {
        let set = ResultSet {
            columns: vec!["MandateId".to_string(), "MarketValue".to_string()],
            rows: vec![
                vec!["37007".to_string(), "1250000.00".to_string()],
                vec!["37008".to_string(), "98000.50".to_string()],
            ],
        };

        let rendered = render_result_table(&set);
        assert!(rendered.contains("MandateId"));
        assert!(rendered.contains("MarketValue"));
        assert!(rendered.contains("37007"));
        assert!(rendered.contains("98000.50"));
    }
}
