//! 컨테이너 로그 외형 보정
//!
//! 정렬된 `(패턴, 치환)` 규칙 목록을 소스 집합별로 적용합니다.
//!
//! | 규칙 | 대상 집합 | 컨테이너 태그 필요 |
//! |------|-----------|--------------------|
//! | `container_spacing` | `container_hosts` | - |
//! | `fractional_datetime` / `bracketed_datetime` / `short_year_datetime` | `date_strip` | O |
//! | `dot_millis_datetime` / `comma_millis_datetime` / `colon_terminated_datetime` | `date_strip_extended` | X |
//!
//! 제거 규칙이 하나라도 적용되면 연속 공백을 하나로 줄입니다.

use std::borrow::Cow;
use std::net::IpAddr;

use regex::Regex;

use crate::error::RelayPipelineError;
use crate::source::SourceSet;

/// 규칙이 적용되는 소스 집합
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    ContainerHosts,
    DateStrip,
    DateStripExtended,
}

/// 재작성 규칙
struct RewriteRule {
    name: &'static str,
    scope: RuleScope,
    pattern: Regex,
    replacement: &'static str,
    /// 0이면 전체 치환
    limit: usize,
    /// 컨테이너 태그(`name [pid]:`)가 있어야 적용
    requires_container_tag: bool,
}

/// 규칙 정의: (이름, 범위, 패턴, 치환, 횟수 제한, 컨테이너 태그 필요)
const RULE_DEFINITIONS: &[(&str, RuleScope, &str, &str, usize, bool)] = &[
    (
        "container_spacing",
        RuleScope::ContainerHosts,
        r"([A-Za-z0-9_.-]+)\[(\d+)\]:",
        "$1 [$2]:",
        1,
        false,
    ),
    (
        "fractional_datetime",
        RuleScope::DateStrip,
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+",
        "",
        0,
        true,
    ),
    (
        "bracketed_datetime",
        RuleScope::DateStrip,
        r"\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\]",
        " ",
        0,
        true,
    ),
    (
        "short_year_datetime",
        RuleScope::DateStrip,
        r"\b\d{2}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} ",
        "",
        0,
        true,
    ),
    (
        "dot_millis_datetime",
        RuleScope::DateStripExtended,
        r"\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}\.\d{3}\b",
        "",
        0,
        false,
    ),
    (
        "comma_millis_datetime",
        RuleScope::DateStripExtended,
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}\b",
        "",
        0,
        false,
    ),
    (
        "colon_terminated_datetime",
        RuleScope::DateStripExtended,
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}:",
        "",
        0,
        false,
    ),
];

/// 컨테이너 태그: `name[pid]:` 또는 `name [pid]:`
const CONTAINER_TAG_PATTERN: &str = r"[A-Za-z0-9_.-]+ ?\[\d+\]:";

/// 재작성에 사용할 장비 집합
#[derive(Debug, Clone, Default)]
pub struct RewriteTargets {
    /// 간격 보정 대상
    pub container_hosts: SourceSet,
    /// 본문 타임스탬프 제거 대상
    pub date_strip: SourceSet,
    /// 확장 타임스탬프 제거 대상
    pub date_strip_extended: SourceSet,
}

/// 외형 보정기
pub struct CosmeticRewriter {
    rules: Vec<RewriteRule>,
    container_tag: Regex,
    whitespace: Regex,
    targets: RewriteTargets,
}

impl CosmeticRewriter {
    /// 대상 집합으로 보정기를 생성합니다.
    pub fn new(targets: RewriteTargets) -> Result<Self, RelayPipelineError> {
        let rules = RULE_DEFINITIONS
            .iter()
            .map(|&(name, scope, pattern, replacement, limit, requires_container_tag)| {
                Ok(RewriteRule {
                    name,
                    scope,
                    pattern: Regex::new(pattern)?,
                    replacement,
                    limit,
                    requires_container_tag,
                })
            })
            .collect::<Result<Vec<_>, RelayPipelineError>>()?;

        Ok(Self {
            rules,
            container_tag: Regex::new(CONTAINER_TAG_PATTERN)?,
            whitespace: Regex::new(r"\s+")?,
            targets,
        })
    }

    /// 규칙을 적용합니다. 실패하면 경고를 남기고 입력을 그대로 반환합니다.
    pub fn rewrite<'a>(
        &self,
        text: &'a str,
        source_ip: IpAddr,
        hostname: Option<&str>,
    ) -> Cow<'a, str> {
        match self.try_rewrite(text, source_ip, hostname) {
            Ok(Some(rewritten)) => Cow::Owned(rewritten),
            Ok(None) => Cow::Borrowed(text),
            Err(e) => {
                tracing::warn!(source = %source_ip, error = %e, "rewrite skipped");
                Cow::Borrowed(text)
            }
        }
    }

    /// 규칙을 적용합니다. 변경이 없으면 `Ok(None)`.
    pub fn try_rewrite(
        &self,
        text: &str,
        source_ip: IpAddr,
        hostname: Option<&str>,
    ) -> Result<Option<String>, RelayPipelineError> {
        let mut current = Cow::Borrowed(text);
        let mut stripped = false;
        let mut last_rule = "";

        for rule in &self.rules {
            if !self.in_scope(rule.scope, source_ip, hostname) {
                continue;
            }
            if rule.requires_container_tag && !self.container_tag.is_match(&current) {
                continue;
            }

            let replaced = rule
                .pattern
                .replacen(&current, rule.limit, rule.replacement);
            if let Cow::Owned(next) = replaced {
                if rule.scope != RuleScope::ContainerHosts {
                    stripped = true;
                }
                last_rule = rule.name;
                current = Cow::Owned(next);
            }
        }

        if stripped {
            let collapsed = self.whitespace.replace_all(&current, " ").into_owned();
            current = Cow::Owned(collapsed);
        }

        if current.trim().is_empty() && !text.trim().is_empty() {
            return Err(RelayPipelineError::Rewrite {
                rule: last_rule.to_owned(),
                reason: "rewrite produced an empty message".to_owned(),
            });
        }

        match current {
            Cow::Borrowed(_) => Ok(None),
            Cow::Owned(s) if s == text => Ok(None),
            Cow::Owned(s) => Ok(Some(s)),
        }
    }

    fn in_scope(&self, scope: RuleScope, source_ip: IpAddr, hostname: Option<&str>) -> bool {
        let set = match scope {
            RuleScope::ContainerHosts => &self.targets.container_hosts,
            RuleScope::DateStrip => &self.targets.date_strip,
            RuleScope::DateStripExtended => &self.targets.date_strip_extended,
        };
        set.matches(source_ip, hostname)
    }

    /// 등록된 규칙 수
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
