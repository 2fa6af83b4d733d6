//! Field attribution.
//!
//! Runs whenever a generated parser stores a field through the session:
//! - scalars take the most recent read boundary off the stack;
//! - nested nodes take the hull of their own, already attributed, fields;
//! - sequences attribute every element and take the hull of the elements.
//!
//! The algorithm relies on the parser storing each scalar right after the
//! read(s) that produced it, and on nested nodes being complete before they
//! are stored into their parent.

use crate::error::TraceError;
use crate::node::{FieldValue, ParsedNode};
use crate::session::{ElementSpan, FieldRange, OffsetLedger, ParseSession};

/// Store `value` into `node.name` and record its byte range.
///
/// `pos` is the stream position at assignment time; empty aggregates are
/// attributed there with length 0.
pub fn assign(
    session: &mut ParseSession,
    pos: u64,
    node: &mut ParsedNode,
    name: &str,
    value: FieldValue,
) -> Result<(), TraceError> {
    if session.config.is_reserved(name) {
        log::trace!("untracked field {}.{}", node.type_name(), name);
        node.set(name, value);
        return Ok(());
    }

    let range = match &value {
        FieldValue::Scalar(_) => pop_range(session, name, 0)?,
        FieldValue::Node(child) => node_range(&session.ledger, child, pos),
        FieldValue::Seq(items) => {
            let spans = sequence_spans(session, name, items, pos, 0)?;
            let range = FieldRange::hull(spans.iter().map(|span| span.range))
                .unwrap_or(FieldRange::new(pos, 0));
            session.ledger.record_elements(node.id(), name, spans);
            range
        }
    };

    log::debug!(
        "attributed {}{}.{} -> [{}, {})",
        node.type_name(),
        node.id(),
        name,
        range.offset,
        range.end()
    );
    session
        .ledger
        .record_field(node.id(), name, range.offset, range.length);
    node.set(name, value);
    Ok(())
}

/// Store the bytes of the read just made into an untracked field.
///
/// The read's boundary is consumed without being recorded, so internal copies
/// such as `_raw_*` buffers leave nothing behind on the stack.
pub fn assign_raw(
    session: &mut ParseSession,
    node: &mut ParsedNode,
    name: &str,
    value: FieldValue,
) -> Result<(), TraceError> {
    let range = pop_range(session, name, 0)?;
    log::trace!(
        "raw field {}.{} consumed [{}, {})",
        node.type_name(),
        name,
        range.offset,
        range.end()
    );
    node.set(name, value);
    Ok(())
}

fn pop_range(
    session: &mut ParseSession,
    field: &str,
    keep: usize,
) -> Result<FieldRange, TraceError> {
    let popped = if session.config.collapse_duplicates {
        session.stack.pop_collapsed(keep)
    } else {
        session.stack.pop()
    };
    let pair = popped.ok_or_else(|| TraceError::StackUnderflow {
        field: field.to_string(),
    })?;
    Ok(FieldRange::new(pair.start, pair.len()))
}

fn node_range(ledger: &OffsetLedger, child: &ParsedNode, pos: u64) -> FieldRange {
    ledger
        .node_hull(child.id())
        .unwrap_or(FieldRange::new(pos, 0))
}

/// Element spans in element order.
///
/// Scalar boundaries sit on the stack in read order, so elements are
/// attributed last-to-first. `keep` is the number of boundaries below this
/// sequence that belong to elements of an enclosing sequence; collapsing never
/// reaches into those, nor into the ones owed to earlier elements here.
fn sequence_spans(
    session: &mut ParseSession,
    field: &str,
    items: &[FieldValue],
    pos: u64,
    keep: usize,
) -> Result<Vec<ElementSpan>, TraceError> {
    let mut remaining = pending_scalars(items);
    let mut spans = Vec::with_capacity(items.len());

    for item in items.iter().rev() {
        let span = match item {
            FieldValue::Scalar(_) => {
                remaining -= 1;
                ElementSpan::leaf(pop_range(session, field, keep + remaining)?)
            }
            FieldValue::Node(child) => ElementSpan::leaf(node_range(&session.ledger, child, pos)),
            FieldValue::Seq(inner) => {
                remaining -= pending_scalars(inner);
                let elements = sequence_spans(session, field, inner, pos, keep + remaining)?;
                let range = FieldRange::hull(elements.iter().map(|span| span.range))
                    .unwrap_or(FieldRange::new(pos, 0));
                ElementSpan { range, elements }
            }
        };
        spans.push(span);
    }

    spans.reverse();
    Ok(spans)
}

fn pending_scalars(items: &[FieldValue]) -> usize {
    items
        .iter()
        .map(|item| match item {
            FieldValue::Scalar(_) => 1,
            FieldValue::Node(_) => 0,
            FieldValue::Seq(inner) => pending_scalars(inner),
        })
        .sum()
}
