/// 科目枚举（IB 课程）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    EnglishALanguageLiterature,
    EnglishALiterature,
    SpanishB,
    EnglishB,
    History,
    BusinessManagement,
    Economics,
    Psychology,
    Biology,
    Chemistry,
    Physics,
    Ess,
    MathAnalysis,
    MathApplications,
    ComputerScience,
    SpanishALanguageLiterature,
    SpanishALiterature,
}

impl Subject {
    /// 表单下拉框中的全部科目，顺序与界面一致
    pub const ALL: [Subject; 17] = [
        Subject::EnglishALanguageLiterature,
        Subject::EnglishALiterature,
        Subject::SpanishB,
        Subject::EnglishB,
        Subject::History,
        Subject::BusinessManagement,
        Subject::Economics,
        Subject::Psychology,
        Subject::Biology,
        Subject::Chemistry,
        Subject::Physics,
        Subject::Ess,
        Subject::MathAnalysis,
        Subject::MathApplications,
        Subject::ComputerScience,
        Subject::SpanishALanguageLiterature,
        Subject::SpanishALiterature,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::EnglishALanguageLiterature => "Eng A: Lang and Lit",
            Subject::EnglishALiterature => "Eng A: Literature",
            Subject::SpanishB => "Spanish B",
            Subject::EnglishB => "English B",
            Subject::History => "History",
            Subject::BusinessManagement => "Business Management",
            Subject::Economics => "Economics",
            Subject::Psychology => "Psychology",
            Subject::Biology => "Biology",
            Subject::Chemistry => "Chemistry",
            Subject::Physics => "Physics",
            Subject::Ess => "ESS",
            Subject::MathAnalysis => "Math AA: Analysis and Approaches",
            Subject::MathApplications => "Math AI: Applications and Interpretations",
            Subject::ComputerScience => "Computer Science",
            Subject::SpanishALanguageLiterature => "Spanish A: Language and Literature",
            Subject::SpanishALiterature => "Spanish A: Literature",
        }
    }

    /// 尝试从字符串解析科目（精确匹配）
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|subject| subject.name() == s.trim())
    }

    /// 智能查找科目（忽略大小写和多余空白）
    pub fn find(s: &str) -> Option<Self> {
        // 先尝试精确匹配
        if let Some(subject) = Self::from_name(s) {
            return Some(subject);
        }

        let wanted = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|subject| subject.name().to_lowercase() == wanted)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subject() {
        assert_eq!(Subject::find("Computer Science"), Some(Subject::ComputerScience));
        assert_eq!(Subject::find("  computer   science "), Some(Subject::ComputerScience));
        assert_eq!(Subject::find("ess"), Some(Subject::Ess));
        assert_eq!(Subject::find("Astrology"), None);
        assert_eq!(Subject::find(""), None);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in Subject::ALL.iter().enumerate() {
            for b in Subject::ALL.iter().skip(i + 1) {
                assert_ne!(a.name(), b.name());
            }
        }
    }
}
