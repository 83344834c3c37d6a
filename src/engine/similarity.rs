// ==========================================
// 文献批次注册系统 - 相似度判定
// ==========================================
// 职责: 定义相似度判定接口 + 默认标题/作者判定器
// 说明: 判定器由编排方注入,合并引擎不关心具体算法
// ==========================================

use crate::domain::document::DocumentFields;

// ==========================================
// SimilarityJudge Trait
// ==========================================
// 用途: 合并引擎判断 已注册文献 与 来稿 是否为同一篇的唯一途径
// 实现者: TitleAuthorJudge（默认）,或编排方自定义
pub trait SimilarityJudge<D: DocumentFields>: Send + Sync {
    /// 判断两篇文献是否相似
    ///
    /// # 参数
    /// - `registered`: 已注册文献
    /// - `incoming`: 批次来稿
    /// - `ignore_name`: 比较时不考虑名称差异（名称变更消解时为 true）
    /// - `ignore_order`: 比较时不考虑序号差异（序号变更消解时为 true）
    ///
    /// # 返回
    /// true 表示两者应视为同一篇文献
    fn are_similar(
        &self,
        registered: &D,
        incoming: &D,
        ignore_name: bool,
        ignore_order: bool,
    ) -> bool;
}

// ==========================================
// TitleAuthorJudge - 默认判定器
// ==========================================
// 规则: 标题相似度与作者相似度均达到阈值才算相似
// 说明: 名称/序号差异由合并引擎的消解流程处理,
//       默认判定器只看标题与作者,两个 ignore 参数留给自定义实现
pub struct TitleAuthorJudge {
    threshold: f64, // 相似度阈值（0.0 ~ 1.0）
}

/// 默认相似度阈值
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;

impl TitleAuthorJudge {
    /// 按指定阈值构造判定器
    ///
    /// # 参数
    /// - `threshold`: 相似度阈值,超出 [0, 1] 时收拢到边界
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for TitleAuthorJudge {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl<D: DocumentFields> SimilarityJudge<D> for TitleAuthorJudge {
    fn are_similar(
        &self,
        registered: &D,
        incoming: &D,
        _ignore_name: bool,
        _ignore_order: bool,
    ) -> bool {
        let title_score = string_similarity(
            &normalize(registered.title()),
            &normalize(incoming.title()),
        );
        let authors_score = author_set_similarity(registered.authors(), incoming.authors());

        title_score >= self.threshold && authors_score >= self.threshold
    }
}

// ==========================================
// 相似度计算
// ==========================================

/// 归一化: 小写 + 压缩空白
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 归一化编辑距离相似度（1.0 = 完全一致）
///
/// # 规则
/// - 两者皆空视为一致（1.0）
/// - 其余为 1 - 编辑距离 / 较长串长度
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }
    let dist = levenshtein(&a_chars, &b_chars);
    1.0 - (dist as f64) / (max_len as f64)
}

/// 作者集合相似度
///
/// # 规则
/// - 两边都无作者视为一致（1.0）
/// - 仅一边无作者视为不一致（0.0）
/// - 其余按归一化拼接串的编辑距离相似度计算
fn author_set_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut a_sorted: Vec<String> = a.iter().map(|s| normalize(s)).collect();
    let mut b_sorted: Vec<String> = b.iter().map(|s| normalize(s)).collect();
    a_sorted.sort();
    b_sorted.sort();
    string_similarity(&a_sorted.join("; "), &b_sorted.join("; "))
}

/// 编辑距离（两行滚动数组）
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
