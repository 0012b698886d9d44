//! 批次规划
//!
//! 纯函数，不做 I/O：第 n 个批次包含过滤后列表中 `[(n-1)*B, n*B)` 的章节。
//! 批次号只在输入列表不变时跨运行稳定；输入变了，旧的结果文件就不再对应。

use crate::models::{Batch, Item};

/// 将有序章节列表按固定大小切分成批次，批次号从 1 开始连续编号
pub fn plan_batches(items: &[Item], batch_size: usize) -> Vec<Batch> {
    if batch_size == 0 {
        return Vec::new();
    }
    items
        .chunks(batch_size)
        .enumerate()
        .map(|(idx, chunk)| Batch {
            number: idx + 1,
            items: chunk.to_vec(),
        })
        .collect()
}

/// 批次总数 = ceil(M / B)
pub fn batch_count(item_count: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    item_count.div_ceil(batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn items(n: usize) -> Vec<Item> {
        (1..=n).map(|i| Item::new(format!("/novel/ch_{}.txt", i))).collect()
    }

    #[test]
    fn test_last_batch_may_be_smaller() {
        let batches = plan_batches(&items(25), 10);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].number, 1);
        assert_eq!(batches[2].number, 3);
        assert_eq!(batches[2].len(), 5);
        assert_eq!(batches[1].items[0].name(), "ch_11.txt");
    }

    #[test]
    fn test_empty_input() {
        assert!(plan_batches(&[], 10).is_empty());
        assert_eq!(batch_count(0, 10), 0);
    }

    proptest! {
        #[test]
        fn prop_partition_law(m in 0usize..200, b in 1usize..40) {
            let list = items(m);
            let batches = plan_batches(&list, b);

            prop_assert_eq!(batches.len(), batch_count(m, b));
            for (idx, batch) in batches.iter().enumerate() {
                prop_assert_eq!(batch.number, idx + 1);
                if idx + 1 < batches.len() {
                    prop_assert_eq!(batch.len(), b);
                } else {
                    prop_assert!(batch.len() >= 1 && batch.len() <= b);
                }
            }

            let rebuilt: Vec<Item> = batches.into_iter().flat_map(|b| b.items).collect();
            prop_assert_eq!(rebuilt, list);
        }
    }
}
