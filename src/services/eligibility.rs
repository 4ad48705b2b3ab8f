//! 抽奖报名资格判定（纯函数，不访问数据库）
//!
//! 检查顺序固定：已关闭 -> 已报名 -> 报名门槛。

use crate::entities::{EligibilityType, lottery_entity as lotteries, user_entity as users};
use crate::models::{IneligibleKind, Ineligibility};

pub fn check_eligibility(
    user: &users::Model,
    lottery: &lotteries::Model,
    participants: &[i64],
) -> Result<(), Ineligibility> {
    if !lottery.is_active || lottery.is_finalized() {
        return Err(Ineligibility::Closed);
    }
    if participants.contains(&user.id) {
        return Err(Ineligibility::AlreadyEntered);
    }

    let passed = match lottery.eligibility_type {
        EligibilityType::All => true,
        EligibilityType::Points => user.points >= lottery.min_points_to_enter,
        // 未配置等级时视为最低等级
        EligibilityType::Level => lottery.min_level.is_none_or(|min| user.level >= min),
        EligibilityType::SpecificUser => lottery.specific_user_id == Some(user.id),
    };

    if passed {
        Ok(())
    } else {
        Err(Ineligibility::Requirement(requirement_kind(lottery.eligibility_type)))
    }
}

/// 报名需扣除的积分，只有 points 类型收费
pub fn entry_cost(lottery: &lotteries::Model) -> i64 {
    match lottery.eligibility_type {
        EligibilityType::Points => lottery.min_points_to_enter.max(0),
        _ => 0,
    }
}

fn requirement_kind(eligibility_type: EligibilityType) -> IneligibleKind {
    match eligibility_type {
        EligibilityType::Points => IneligibleKind::Points,
        EligibilityType::Level => IneligibleKind::Level,
        EligibilityType::All | EligibilityType::SpecificUser => IneligibleKind::SpecificUser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CommunicationPref, LotteryStatus, UserLevel};

    fn user(id: i64, points: i64, level: UserLevel) -> users::Model {
        users::Model {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            phone: None,
            address: None,
            communication_pref: CommunicationPref::Whatsapp,
            avatar: None,
            points,
            level,
            is_admin: false,
            created_at: None,
            updated_at: None,
        }
    }

    fn lottery(eligibility_type: EligibilityType) -> lotteries::Model {
        lotteries::Model {
            id: 1,
            title: "Shabbat dinner for two".into(),
            prize: "Dinner voucher".into(),
            draw_date: None,
            image: None,
            is_active: true,
            status: LotteryStatus::Open,
            winner_id: None,
            eligibility_type,
            min_points_to_enter: 0,
            min_level: None,
            specific_user_id: None,
            drawn_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_all_type_accepts_everyone() {
        let l = lottery(EligibilityType::All);
        assert_eq!(check_eligibility(&user(1, 0, UserLevel::Beginner), &l, &[]), Ok(()));
    }

    #[test]
    fn test_points_threshold_is_inclusive() {
        let mut l = lottery(EligibilityType::Points);
        l.min_points_to_enter = 100;
        assert_eq!(check_eligibility(&user(1, 100, UserLevel::Beginner), &l, &[]), Ok(()));
        assert_eq!(
            check_eligibility(&user(2, 99, UserLevel::Beginner), &l, &[]),
            Err(Ineligibility::Requirement(IneligibleKind::Points))
        );
        assert_eq!(entry_cost(&l), 100);
    }

    #[test]
    fn test_level_uses_rank_order() {
        let mut l = lottery(EligibilityType::Level);
        l.min_level = Some(UserLevel::Leader);
        assert_eq!(
            check_eligibility(&user(1, 0, UserLevel::Active), &l, &[]),
            Err(Ineligibility::Requirement(IneligibleKind::Level))
        );
        assert_eq!(check_eligibility(&user(2, 0, UserLevel::Leader), &l, &[]), Ok(()));
        assert_eq!(check_eligibility(&user(3, 0, UserLevel::Creator), &l, &[]), Ok(()));
        assert_eq!(entry_cost(&l), 0);
    }

    #[test]
    fn test_specific_user() {
        let mut l = lottery(EligibilityType::SpecificUser);
        l.specific_user_id = Some(7);
        assert_eq!(check_eligibility(&user(7, 0, UserLevel::Beginner), &l, &[]), Ok(()));
        assert_eq!(
            check_eligibility(&user(8, 0, UserLevel::Ambassador), &l, &[]),
            Err(Ineligibility::Requirement(IneligibleKind::SpecificUser))
        );
    }

    #[test]
    fn test_closed_and_entered_take_precedence() {
        let mut l = lottery(EligibilityType::Points);
        l.min_points_to_enter = 1000;

        assert_eq!(
            check_eligibility(&user(1, 0, UserLevel::Beginner), &l, &[1]),
            Err(Ineligibility::AlreadyEntered)
        );

        l.is_active = false;
        l.status = LotteryStatus::Drawn;
        l.winner_id = Some(2);
        assert_eq!(
            check_eligibility(&user(1, 0, UserLevel::Beginner), &l, &[1]),
            Err(Ineligibility::Closed)
        );
    }
}
