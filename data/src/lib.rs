//! Static reference data: the per-class skill dictionary, the equipment
//! set/type vocabularies, and the fuzzy matching that corrects noisy OCR
//! names back to canonical ones.
//!
//! OCR errors on a closed vocabulary are usually small (dropped or
//! substituted glyphs), so cheap exact/substring checks handle the common
//! case and edit distance recovers the rest.

/// Skill names of one character class, split by kind.
///
/// Order matters: it is the in-game panel order, and ties in fuzzy matching
/// resolve to the first entry.
#[derive(Debug, Clone, Copy)]
pub struct ClassSkills {
	pub active: &'static [&'static str],
	pub passive: &'static [&'static str],
}

impl ClassSkills {
	pub fn all(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.active.iter().chain(self.passive.iter()).copied()
	}
}

pub const CLASSES: &[(&str, ClassSkills)] = &[
	(
		"검성",
		ClassSkills {
			active: &[
				"내려찍기", "분쇄 파동", "파멸의 맹타", "절단의 맹타", "도약 찍기",
				"돌진 일격", "예리한 일격", "유린의 검", "발목 베기", "충격 해제",
				"검기 난무", "공중 결박",
			],
			passive: &[
				"공격 준비", "충격 적중", "약점 파악", "노련한 반격", "살기 파열",
				"생존 자세", "피의 흡수", "생존 의지", "파괴 충동", "보호의 갑옷",
			],
		},
	),
	(
		"수호성",
		ClassSkills {
			active: &[
				"연속 난타", "심판", "맹렬한 일격", "징벌", "비호의 일격",
				"방패 강타", "쇠약의 맹타", "포획", "방패 돌격", "섬멸",
				"충격 해제", "섬광 난무",
			],
			passive: &[
				"격앙", "충격 적중", "철벽 방어", "체력 강화", "단죄의 가호",
				"고통 차단", "생존 의지", "수호의 인장", "모욕의 포효", "비호의 방패",
			],
		},
	),
	(
		"살성",
		ClassSkills {
			active: &[
				"심장 찌르기", "빠른 베기", "기습", "문양 폭발", "맹수의 포효",
				"폭풍 난무", "암습", "회오리 베기", "섬광 베기", "침투",
				"충격 해제", "그림자 낙하",
			],
			passive: &[
				"강습 자세", "배후 강타", "충격 적중", "빈틈 노리기", "육감 극대화",
				"방어 균열", "각오", "회생의 계약", "기습 자세", "독 바르기",
			],
		},
	),
	(
		"궁성",
		ClassSkills {
			active: &[
				"저격", "속사", "조준 화살", "송곳 화살", "광풍 화살",
				"표적 화살", "파열 화살", "제압 화살", "올가미 화살", "폭발의 덫",
				"충격 해제", "화살 난사",
			],
			passive: &[
				"집중의 눈", "사냥꾼의 결의", "사냥꾼의 혼", "집중 포화", "경계의 눈",
				"속박의 눈", "근접 사격", "회생의 계약", "저항의 결의", "바람의 활력",
			],
		},
	),
	(
		"마도성",
		ClassSkills {
			active: &[
				"불꽃 화살", "불꽃 폭발", "혹한의 바람", "집중의 기원", "얼음 사슬",
				"불꽃 작살", "겨울의 속박", "지옥의 화염", "빙결", "빙결 폭발",
				"화염 난사", "충격 해제",
			],
			passive: &[
				"불꽃의 로브", "불의 표식", "생기 증발", "냉기 소환", "정기 흡수",
				"강화의 은혜", "회생의 계약", "저항의 은혜", "냉기의 로브", "대지의 로브",
			],
		},
	),
	(
		"정령성",
		ClassSkills {
			active: &[
				"화염 전소", "냉기 충격", "원소 융합", "협공: 저주", "소환: 물의 정령",
				"공간 지배", "영혼의 절규", "소환: 바람의 정령", "연속 난사", "소환: 불의 정령",
				"충격 해제", "소환: 땅의 정령",
			],
			passive: &[
				"정령 타격", "정신 집중", "침식", "정령 강림", "정령 보호",
				"연속 역류", "원소 결집", "회생의 계약", "정령 교감", "정령 회생",
			],
		},
	),
	(
		"치유성",
		ClassSkills {
			active: &[
				"쾌유의 광휘", "심판의 번개", "재생의 빛", "치유의 빛", "단죄",
				"대지의 응보", "고통의 연쇄", "신성한 기운", "벼락 난사", "약화의 낙인",
				"벽력", "충격 해제",
			],
			passive: &[
				"대지의 은총", "치유력 강화", "불사의 장막", "주신의 은총", "따뜻한 가호",
				"생존 의지", "찬란한 가호", "집중의 기도", "주신의 가호", "회복 차단",
			],
		},
	),
	(
		"호법성",
		ClassSkills {
			active: &[
				"암격쇄", "격파쇄", "백열격", "쾌유의 주문", "회전격",
				"타격쇄", "돌진 격파", "열파격", "파동격", "질풍 난무",
				"진동쇄", "충격 해제",
			],
			passive: &[
				"공격 준비", "충격 적중", "고취의 주문", "생명의 축복", "대지의 약속",
				"바람의 약속", "생존 의지", "보호진", "격노의 주문", "십자 방어",
			],
		},
	),
];

/// Equipment set names (left side of the `<set> 의 <type>` panel header).
pub const SET_NAMES: &[&str] = &["활력", "마력", "광분", "순수"];

/// Equipment type names (right side of the panel header).
pub const TYPE_NAMES: &[&str] = &["성배", "양피지", "나침반", "종", "거울", "천칭"];

/// Panel chrome that must never be emitted as a skill name.
pub const IGNORE_WORDS: &[&str] = &[
	"강화 단계", "강화단계", "장착 효과", "장착효과", "세트 효과", "세트효과",
	"성배", "양피지", "나침반", "거울", "천칭",
];

pub fn class_names() -> Vec<&'static str> {
	CLASSES.iter().map(|(name, _)| *name).collect()
}

pub fn class_skills(class: &str) -> Option<&'static ClassSkills> {
	CLASSES
		.iter()
		.find(|(name, _)| *name == class)
		.map(|(_, skills)| skills)
}

/// Every known skill name, class order, first occurrence only.
pub fn all_skills() -> Vec<&'static str> {
	let mut all = Vec::new();
	for (_, skills) in CLASSES {
		for skill in skills.all() {
			if !all.contains(&skill) {
				all.push(skill);
			}
		}
	}
	all
}

/// Skill names scoped to a class; an unknown or absent class falls back to
/// the full dictionary.
pub fn skills_for(class: Option<&str>) -> Vec<&'static str> {
	match class.and_then(class_skills) {
		Some(skills) => skills.all().collect(),
		None => all_skills(),
	}
}

/// Correct a noisy OCR name to its canonical dictionary form.
///
/// Cascade, first hit wins: exact, substring containment either direction
/// (dictionary names of at least 2 chars), then minimum Levenshtein distance
/// accepted within half of the longer name's length. `None` means "keep the
/// OCR text as-is".
pub fn match_skill(ocr_text: &str, class: Option<&str>) -> Option<&'static str> {
	let skills = skills_for(class);
	let cleaned = collapse_whitespace(ocr_text);
	if cleaned.is_empty() {
		return None;
	}

	if let Some(exact) = skills.iter().find(|s| **s == cleaned) {
		return Some(*exact);
	}

	if let Some(contained) = skills
		.iter()
		.find(|s| s.chars().count() >= 2 && (cleaned.contains(**s) || s.contains(&cleaned)))
	{
		return Some(*contained);
	}

	let mut best: Option<&'static str> = None;
	let mut best_dist = usize::MAX;
	for skill in skills {
		let dist = levenshtein::levenshtein(&cleaned, skill);
		if dist < best_dist {
			best_dist = dist;
			best = Some(skill);
		}
	}

	let best = best?;
	let max_len = cleaned.chars().count().max(best.chars().count());
	if best_dist <= max_len / 2 {
		return Some(best);
	}

	None
}

/// Exact-then-substring lookup against a small fixed vocabulary (set/type
/// names). Whitespace inside the candidate is discarded entirely, since OCR
/// splits short Hangul words at random.
pub fn match_exact(text: &str, vocabulary: &[&'static str]) -> Option<&'static str> {
	let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
	if let Some(exact) = vocabulary.iter().find(|v| **v == cleaned) {
		return Some(exact);
	}
	vocabulary
		.iter()
		.find(|v| v.chars().count() >= 2 && (cleaned.contains(**v) || v.contains(&cleaned)))
		.copied()
}

/// Whether a line/name is known panel chrome rather than a skill.
pub fn is_ignored(text: &str) -> bool {
	let cleaned = collapse_whitespace(text);
	IGNORE_WORDS.iter().any(|word| cleaned.contains(word))
}

pub fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}
