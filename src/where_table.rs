//! Data tables written in Where phases
//!
//! The first statement of a Where phase is the header, the remaining statements are
//! rows. Both use `|` between cells:
//!
//! ```text
//! Where
//!   a | b | c
//!   1 | 2 | 3
//!   4 | 5 | 9
//! ```
//!
//! Pipes associate to the left, so a row `1 | 2 | 3` reads as `(1 | 2) | 3` and is
//! flattened back into its cells here.

use crate::blocks::Block;
use crate::error::TransformError;
use crate::tree::build::array;
use crate::tree::view::WhereView;
use crate::tree::{Node, Range};

fn pipe_operands(node: &Node) -> Option<(&Node, &Node)> {
    let call = node.as_call()?;
    if call.method != "|" || call.args.len() != 1 {
        return None;
    }
    Some((call.receiver?, call.args[0].as_node()?))
}

/// Cells of a `|`-separated row, left to right.
pub fn flatten_cells(node: &Node) -> Vec<&Node> {
    match pipe_operands(node) {
        Some((left, right)) => {
            let mut cells = flatten_cells(left);
            cells.extend(flatten_cells(right));
            cells
        }
        None => vec![node],
    }
}

pub fn parse_header(node: &Node) -> Result<Vec<String>, TransformError> {
    flatten_cells(node)
        .into_iter()
        .map(|cell| match cell.bare_call_name() {
            Some(name) => Ok(name.to_string()),
            None => Err(TransformError::MalformedTable {
                message: format!("header cells must be bare column names, found {}", cell),
                location: cell.location().or(node.location()).cloned(),
            }),
        })
        .collect()
}

/// Builds the `ps_where` IR for a Where block.
pub fn parse_table(block: &Block) -> Result<Node, TransformError> {
    let location: Option<Range> = block.location().cloned();
    let Some((header_row, rows)) = block.statements.split_first() else {
        return Err(TransformError::MalformedTable {
            message: "a header row naming the columns is required".to_string(),
            location,
        });
    };
    let header = parse_header(header_row)?;

    let rows = rows
        .iter()
        .map(|row| {
            let cells: Vec<Node> = flatten_cells(row).into_iter().cloned().collect();
            if cells.len() != header.len() {
                return Err(TransformError::MalformedTable {
                    message: format!(
                        "row has {} values but the header declares {} columns",
                        cells.len(),
                        header.len()
                    ),
                    location: row.location().cloned(),
                });
            }
            Ok(array(cells).at(row.location().cloned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WhereView::build(&header, rows).at(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Phase;
    use crate::tree::build::{call, int, lvar};
    use crate::tree::IrView;

    fn pipe(left: Node, right: Node) -> Node {
        call(Some(left), "|", vec![right.into()])
    }

    fn col(name: &str) -> Node {
        call(None, name, vec![])
    }

    fn where_block(statements: Vec<Node>) -> Block {
        Block {
            phase: Phase::Where,
            introducer: Some(col("Where")),
            statements,
        }
    }

    #[test]
    fn test_flattens_left_associative_pipes() {
        let row = pipe(pipe(int(1), int(2)), int(3));
        assert_eq!(flatten_cells(&row), vec![&int(1), &int(2), &int(3)]);
    }

    #[test]
    fn test_single_column_table() {
        let table = parse_table(&where_block(vec![col("a"), int(1), int(2)])).unwrap();
        let Some(IrView::Where(view)) = IrView::of(&table) else {
            panic!("expected a where table");
        };
        assert_eq!(view.header(), vec!["a"]);
        assert_eq!(view.rows().cloned().collect::<Vec<_>>(), vec![array(vec![int(1)]), array(vec![int(2)])]);
    }

    #[test]
    fn test_header_must_be_bare_names() {
        let err = parse_header(&pipe(col("a"), lvar("b"))).unwrap_err();
        assert!(matches!(err, TransformError::MalformedTable { .. }));
    }

    #[test]
    fn test_empty_where_block() {
        let err = parse_table(&where_block(vec![])).unwrap_err();
        assert!(err.to_string().contains("header row"));
    }

    #[test]
    fn test_row_width_must_match_header() {
        let block = where_block(vec![
            pipe(col("a"), col("b")),
            pipe(int(1), int(2)),
            pipe(pipe(int(1), int(2)), int(3)),
        ]);
        let err = parse_table(&block).unwrap_err();
        assert!(err
            .to_string()
            .contains("row has 3 values but the header declares 2 columns"));
    }

    #[test]
    fn test_header_only_table_has_no_rows() {
        let table = parse_table(&where_block(vec![pipe(col("a"), col("b"))])).unwrap();
        let Some(IrView::Where(view)) = IrView::of(&table) else {
            panic!("expected a where table");
        };
        assert_eq!(view.rows().count(), 0);
    }
}
