// src/selector.rs

use crate::models::Entry;
use rand::Rng;

/// 从候选集中等概率抽取一条；候选为空时返回 None
pub fn pick<'a, R: Rng + ?Sized>(candidates: &[&'a Entry], rng: &mut R) -> Option<&'a Entry> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

pub fn pick_random<'a>(candidates: &[&'a Entry]) -> Option<&'a Entry> {
    pick(candidates, &mut rand::thread_rng())
}
