use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use markerforge::pairwise::TwoPointTable;
use markerforge::types::{Item, MappedOrder};

pub fn names(items: &[Item], table: &TwoPointTable) -> Vec<String> {
    items
        .iter()
        .map(|&i| {
            table
                .name_of(i)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", i))
        })
        .collect()
}

pub fn print_order_table(title: &str, mapped: &MappedOrder, table: &TwoPointTable) {
    println!("\nOrder: {} ({} markers)", title, mapped.len());
    let mut out = Table::new();
    out.load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    out.add_row(vec![
        Cell::new("Pos").add_attribute(Attribute::Bold),
        Cell::new("Marker").add_attribute(Attribute::Bold),
        Cell::new("rf to next"),
        Cell::new("Phase"),
        Cell::new("Cum. rf").fg(Color::Cyan),
    ]);
    for i in [0, 2, 3, 4] {
        if let Some(col) = out.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    let fitness = mapped.fitness();
    let labels = names(mapped.order().items(), table);
    let mut cumulative = 0.0;
    for (pos, label) in labels.iter().enumerate() {
        let (rf, phase) = match (fitness.recombination.get(pos), fitness.phases.get(pos)) {
            (Some(rf), Some(phase)) if !fitness.is_dominated() => {
                (format!("{:.4}", rf), phase.to_string())
            }
            _ => ("-".to_string(), "-".to_string()),
        };
        out.add_row(vec![
            Cell::new(pos + 1),
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(rf),
            Cell::new(phase),
            Cell::new(format!("{:.4}", cumulative)).fg(Color::Cyan),
        ]);
        if let Some(rf) = fitness.recombination.get(pos).filter(|rf| rf.is_finite()) {
            cumulative += rf;
        }
    }
    println!("{}", out);
}

/// One row per unplaced marker, one column per insertion slot.
pub fn print_lod_matrix(matrix: &[(Item, Vec<f64>)], table: &TwoPointTable) {
    if matrix.is_empty() {
        return;
    }
    println!("\nLOD profile of unpositioned markers (slot k = before position k+1)");
    let mut out = Table::new();
    out.load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let slots = matrix.iter().map(|(_, l)| l.len()).max().unwrap_or(0);
    let mut header = vec![Cell::new("Marker").add_attribute(Attribute::Bold)];
    header.extend((0..slots).map(|k| Cell::new(k + 1)));
    out.add_row(header);

    for (item, lods) in matrix {
        let mut row = vec![Cell::new(names(&[*item], table).join("")).add_attribute(Attribute::Bold)];
        row.extend(lods.iter().map(|&v| {
            let cell = Cell::new(format!("{:.2}", v)).set_alignment(CellAlignment::Right);
            if v == 0.0 {
                cell.fg(Color::Green)
            } else {
                cell
            }
        }));
        out.add_row(row);
    }
    println!("{}", out);
}
