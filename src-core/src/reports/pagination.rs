use crate::reports::reports_model::{PaginationView, Transaction, TypeFilter};

/// Slice one page out of the filtered transaction window.
///
/// Pages are 1-based; page 0 is read as page 1 and a zero page size as 1.
/// `total_pages` is never below 1, so an empty window still has one
/// (empty) page. Pages past the end are empty.
pub fn paginate(
    transactions: &[Transaction],
    type_filter: TypeFilter,
    page_index: usize,
    page_size: usize,
) -> PaginationView {
    let page_size = page_size.max(1);
    let page_index = page_index.max(1);

    let filtered: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| type_filter.matches(t.kind))
        .collect();

    let total_pages = filtered.len().div_ceil(page_size).max(1);
    let start = (page_index - 1).saturating_mul(page_size);

    let page_items = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    PaginationView {
        page_items,
        total_pages,
    }
}
