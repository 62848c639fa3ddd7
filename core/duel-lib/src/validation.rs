//! 配置與隊伍檢查

use crate::error::{BuildError, Result};
use crate::{Build, Mode};
use skills_lib::{AssistType, GameData, SkillType, SpecialType, WeaponType};
use std::collections::BTreeSet;

/// 決鬥模式的隊伍人數
pub const DUEL_TEAM_SIZE: usize = 5;

/// 檢查單一配置：技能存在、每個欄位最多一個、武器種類相符、可以習得
pub fn validate_build(data: &GameData, build: &Build) -> Result<()> {
    let hero = data.hero(&build.hero).ok_or_else(|| BuildError::UnknownHero {
        hero: build.hero.clone(),
    })?;

    let mut slots: Vec<SkillType> = Vec::new();
    for skill_id in &build.skills {
        let skill = data.skill(skill_id).ok_or_else(|| BuildError::UnknownSkill {
            skill: skill_id.clone(),
        })?;
        if slots.contains(&skill.skill_type) {
            return Err(BuildError::DuplicateSkillSlot {
                hero: build.hero.clone(),
                slot: skill.skill_type,
            }
            .into());
        }
        slots.push(skill.skill_type);

        if skill.skill_type == SkillType::Weapon && skill.weapon_type != Some(hero.weapon_type) {
            return Err(BuildError::WeaponTypeMismatch {
                hero: build.hero.clone(),
                skill: skill_id.clone(),
            }
            .into());
        }

        let allowed = skill
            .can_use
            .as_ref()
            .is_none_or(|can_use| can_use.allows(&build.hero, hero.weapon_type, hero.move_type));
        // 杖只能裝備治療奧義
        let healer_ok = skill.skill_type != SkillType::Special
            || hero.weapon_type != WeaponType::Staff
            || skill.is_special_type(SpecialType::Healing);
        if !allowed || !healer_ok {
            return Err(BuildError::CannotLearn {
                hero: build.hero.clone(),
                skill: skill_id.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// 檢查整隊；決鬥模式另外限制人數、英雄重複與再行動輔助數量
pub fn validate_team(data: &GameData, builds: &[Build], mode: Mode) -> Result<()> {
    for build in builds {
        validate_build(data, build)?;
    }

    let mut seals = BTreeSet::new();
    for skill_id in builds.iter().flat_map(|b| b.skills.iter()) {
        let is_seal = data
            .skill(skill_id)
            .is_some_and(|skill| skill.skill_type == SkillType::S);
        if is_seal && !seals.insert(skill_id.as_str()) {
            return Err(BuildError::DuplicateSeal {
                skill: skill_id.clone(),
            }
            .into());
        }
    }

    if mode == Mode::Duel {
        if builds.len() != DUEL_TEAM_SIZE {
            return Err(BuildError::TeamSize {
                expected: DUEL_TEAM_SIZE,
                found: builds.len(),
            }
            .into());
        }
        let mut heroes = BTreeSet::new();
        for build in builds {
            if !heroes.insert(build.hero.as_str()) {
                return Err(BuildError::DuplicateHero {
                    hero: build.hero.clone(),
                }
                .into());
            }
        }
        let refreshers = builds
            .iter()
            .filter(|build| {
                build.skills.iter().any(|id| {
                    data.skill(id)
                        .is_some_and(|skill| skill.is_assist_type(AssistType::Refresh))
                })
            })
            .count();
        if refreshers > 1 {
            return Err(BuildError::TooManyRefreshers.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn build(hero: &str, skills: &[&str]) -> Build {
        Build {
            hero: hero.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn build_error(result: Result<()>) -> Option<BuildError> {
        match result {
            Err(err) => match err.into_kind() {
                ErrorKind::Build(e) => Some(e),
                _ => None,
            },
            Ok(()) => None,
        }
    }

    #[test]
    fn test_validate_build() {
        let data = GameData::builtin().expect("builtin data");
        let test_data = [
            (build("ALFONSE", &["SILVER_SWORD_PLUS", "BRAVE_SWORD_PLUS"]), false),
            (build("ALFONSE", &["SILVER_LANCE_PLUS"]), false),
            (build("ALFONSE", &["FOLKVANGR"]), true),
            (build("ANNA", &["FOLKVANGR"]), false),
            (build("AZAMA", &["ABSORB_PLUS"]), true),
            (build("AZAMA", &["MOONBOW"]), false),
            (build("ALFONSE", &["DEATH_BLOW_3", "DEATH_BLOW_3_SEAL"]), true),
            (build("NOBODY", &[]), false),
            (build("ALFONSE", &["NO_SUCH_SKILL"]), false),
        ];
        for (idx, (build, expected)) in test_data.iter().enumerate() {
            assert_eq!(validate_build(&data, build).is_ok(), *expected, "Case {}", idx);
        }
    }

    #[test]
    fn test_duplicate_seal() {
        let data = GameData::builtin().expect("builtin data");
        let team = [
            build("ALFONSE", &["DEATH_BLOW_3_SEAL"]),
            build("ANNA", &["DEATH_BLOW_3_SEAL"]),
        ];
        assert!(matches!(
            build_error(validate_team(&data, &team, Mode::Regular)),
            Some(BuildError::DuplicateSeal { .. })
        ));
    }

    #[test]
    fn test_duel_team_rules() {
        let data = GameData::builtin().expect("builtin data");
        let four = [
            build("ALFONSE", &[]),
            build("ANNA", &[]),
            build("ABEL", &[]),
            build("CATRIA", &[]),
        ];
        assert!(matches!(
            build_error(validate_team(&data, &four, Mode::Duel)),
            Some(BuildError::TeamSize { expected: 5, found: 4 })
        ));
        assert!(validate_team(&data, &four, Mode::Regular).is_ok());

        let duplicate = [
            build("ALFONSE", &[]),
            build("ALFONSE", &["SILVER_SWORD_PLUS"]),
            build("ANNA", &[]),
            build("ABEL", &[]),
            build("CATRIA", &[]),
        ];
        assert!(matches!(
            build_error(validate_team(&data, &duplicate, Mode::Duel)),
            Some(BuildError::DuplicateHero { .. })
        ));

        let one_dancer = [
            build("OLIVIA", &["DANCE"]),
            build("ALFONSE", &[]),
            build("ANNA", &[]),
            build("ABEL", &[]),
            build("CATRIA", &[]),
        ];
        assert!(validate_team(&data, &one_dancer, Mode::Duel).is_ok());

        let two_dancers = [
            build("OLIVIA", &["DANCE"]),
            build("NINIAN", &["DANCE"]),
            build("ANNA", &[]),
            build("ABEL", &[]),
            build("CATRIA", &[]),
        ];
        assert!(matches!(
            build_error(validate_team(&data, &two_dancers, Mode::Duel)),
            Some(BuildError::TooManyRefreshers)
        ));
    }
}
