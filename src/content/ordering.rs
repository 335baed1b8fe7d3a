/// Items that live in a dense, 1-based ordered list.
pub trait Ordered {
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("position {index} is out of range for {len} item(s)")]
    OutOfRange { index: usize, len: usize },
}

/// Rewrites `order` to `1..=len` following the current slice order.
pub fn normalize_order<T: Ordered>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order(idx as u32 + 1);
    }
}

/// Sorts by the stored `order` (stable for ties) and then renumbers, so a
/// list read back from storage with gaps or repeats becomes dense again.
pub fn sort_and_normalize<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order);
    normalize_order(items);
}

pub fn push_item<T: Ordered>(items: &mut Vec<T>, item: T) {
    items.push(item);
    normalize_order(items);
}

pub fn insert_item<T: Ordered>(items: &mut Vec<T>, index: usize, item: T) -> Result<(), OrderError> {
    if index > items.len() {
        return Err(OrderError::OutOfRange {
            index,
            len: items.len(),
        });
    }
    items.insert(index, item);
    normalize_order(items);
    Ok(())
}

pub fn remove_item<T: Ordered>(items: &mut Vec<T>, index: usize) -> Result<T, OrderError> {
    if index >= items.len() {
        return Err(OrderError::OutOfRange {
            index,
            len: items.len(),
        });
    }
    let removed = items.remove(index);
    normalize_order(items);
    Ok(removed)
}

pub fn move_item<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), OrderError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(OrderError::OutOfRange { index, len });
        }
    }
    let item = items.remove(from);
    items.insert(to, item);
    normalize_order(items);
    Ok(())
}

pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(idx, item)| item.order() == idx as u32 + 1)
}
