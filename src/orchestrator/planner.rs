//! 批次划分
//!
//! 把有序的条目切成连续的批次，批次顺序与输入顺序一致

/// 一个批次：输入序列中的一段连续切片
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a, T> {
    /// 批次编号（从1开始）
    pub number: usize,
    /// 第一个条目在输入中的位置
    pub start: usize,
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 最后一个条目之后的位置
    pub fn end(&self) -> usize {
        self.start + self.items.len()
    }
}

/// 按批大小划分批次（惰性）
///
/// 空输入不产生任何批次
pub fn plan_batches<T>(items: &[T], batch_size: usize) -> impl Iterator<Item = Batch<'_, T>> {
    let batch_size = batch_size.max(1);
    items
        .chunks(batch_size)
        .enumerate()
        .map(move |(idx, chunk)| Batch {
            number: idx + 1,
            start: idx * batch_size,
            items: chunk,
        })
}

/// 批次总数
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    let batch_size = batch_size.max(1);
    (total + batch_size - 1) / batch_size
}
