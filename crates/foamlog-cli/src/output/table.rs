use foamlog_core::table::Table;

/// Plain-text rendering with columns padded to their widest cell.
pub fn format_table(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, table.columns.iter().map(String::as_str), &widths);
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out.push_str(&format!("\n{} row(s)\n", table.len()));
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
