//! 심볼 배치 분할.

/// `items`를 최대 `chunk_size` 길이의 연속 구간으로 나눕니다.
///
/// 순서를 유지하며 겹치거나 빠지는 항목이 없습니다. `chunk_size`가 0이면 1로 취급합니다.
pub fn chunk<T>(items: &[T], chunk_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(chunk_size.max(1))
}
