//! 结果汇总
//!
//! 结果按条目在输入中的位置写入预分配的槽位，而不是按完成顺序追加，
//! 所以报告顺序永远与输入一致。

use tracing::warn;

use crate::models::{BatchReport, OperationOutcome};

/// 按位置收集结果
#[derive(Debug)]
pub struct ResultAggregator {
    slots: Vec<Option<OperationOutcome>>,
}

impl ResultAggregator {
    /// 为 `total` 个条目预留槽位
    pub fn new(total: usize) -> Self {
        Self {
            slots: vec![None; total],
        }
    }

    /// 写入一个结果，每个槽位只写一次
    pub fn record(&mut self, outcome: OperationOutcome) {
        let index = outcome.index;
        let total = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(outcome),
            Some(_) => warn!("[条目 {}] 结果重复写入，已忽略", index + 1),
            None => warn!(
                "[条目 {}] 位置超出范围 (共 {} 条)，已忽略",
                index + 1,
                total
            ),
        }
    }

    pub fn record_all(&mut self, outcomes: impl IntoIterator<Item = OperationOutcome>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    /// 已写入的结果数
    pub fn recorded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// 生成报告，未执行的条目不出现在报告中
    pub fn finish(self, aborted: bool) -> BatchReport {
        let total = self.slots.len();
        let outcomes = self.slots.into_iter().flatten().collect();
        BatchReport::new(total, outcomes, aborted)
    }
}
