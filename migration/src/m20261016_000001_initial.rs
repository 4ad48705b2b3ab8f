use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Phone,
    Address,
    CommunicationPref,
    Avatar,
    Points,
    Level,
    IsAdmin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserLikedEvents {
    Table,
    Id,
    UserId,
    EventId,
    CreatedAt,
}

/// 积分配置 (key/value)，主键保证每个配置项只有一行
#[derive(DeriveIden)]
enum AppSettings {
    Table,
    Key,
    Value,
    UpdatedAt,
}

/// 积分流水
#[derive(DeriveIden)]
enum PointTransactions {
    Table,
    Id,
    UserId,
    Amount,
    BalanceAfter,
    Reason,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GiftCodes {
    Table,
    Id,
    Code,
    Points,
    MaxUses,
    UsedCount,
    ExpiresAt,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GiftCodeRedemptions {
    Table,
    Id,
    GiftCodeId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Title,
    Date,
    Location,
    Category,
    Price,
    Image,
    IsHero,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EventAttendees {
    Table,
    Id,
    EventId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EventShares {
    Table,
    Id,
    EventId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EventRatings {
    Table,
    Id,
    EventId,
    UserId,
    Rating,
    CreatedAt,
    UpdatedAt,
}

/// 课程 / 小组活动（每周固定时间）
#[derive(DeriveIden)]
enum Classes {
    Table,
    Id,
    Title,
    Instructor,
    ContactPhone,
    Day,
    Time,
    Location,
    Price,
    AgeGroup,
    Image,
    Category,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lotteries {
    Table,
    Id,
    Title,
    Prize,
    DrawDate,
    Image,
    IsActive,
    Status,
    WinnerId,
    EligibilityType,
    MinPointsToEnter,
    MinLevel,
    SpecificUserId,
    DrawnAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LotteryParticipants {
    Table,
    Id,
    LotteryId,
    UserId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_at_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id_column(Users::Id))
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Phone).string_len(32).null())
                    .col(ColumnDef::new(Users::Address).string_len(255).null())
                    .col(
                        ColumnDef::new(Users::CommunicationPref)
                            .string_len(16)
                            .not_null()
                            .default("whatsapp"),
                    )
                    .col(ColumnDef::new(Users::Avatar).text().null())
                    .col(
                        ColumnDef::new(Users::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::Level)
                            .string_len(16)
                            .not_null()
                            .default("beginner"),
                    )
                    .col(
                        ColumnDef::new(Users::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at_column(Users::CreatedAt))
                    .col(&mut created_at_column(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email_unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 配置表
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSettings::Key)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppSettings::Value).big_integer().not_null())
                    .col(&mut created_at_column(AppSettings::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // 积分流水表
        manager
            .create_table(
                Table::create()
                    .table(PointTransactions::Table)
                    .if_not_exists()
                    .col(&mut id_column(PointTransactions::Id))
                    .col(
                        ColumnDef::new(PointTransactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::Reason)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointTransactions::Description).text().null())
                    .col(&mut created_at_column(PointTransactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_point_transactions_user")
                            .from(PointTransactions::Table, PointTransactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_user")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        // 礼品码
        manager
            .create_table(
                Table::create()
                    .table(GiftCodes::Table)
                    .if_not_exists()
                    .col(&mut id_column(GiftCodes::Id))
                    .col(ColumnDef::new(GiftCodes::Code).string_len(64).not_null())
                    .col(ColumnDef::new(GiftCodes::Points).big_integer().not_null())
                    .col(ColumnDef::new(GiftCodes::MaxUses).integer().not_null())
                    .col(
                        ColumnDef::new(GiftCodes::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GiftCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GiftCodes::CreatedBy).big_integer().null())
                    .col(&mut created_at_column(GiftCodes::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // 礼品码区分大小写且唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gift_codes_code_unique")
                    .table(GiftCodes::Table)
                    .col(GiftCodes::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GiftCodeRedemptions::Table)
                    .if_not_exists()
                    .col(&mut id_column(GiftCodeRedemptions::Id))
                    .col(
                        ColumnDef::new(GiftCodeRedemptions::GiftCodeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GiftCodeRedemptions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(&mut created_at_column(GiftCodeRedemptions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_gift_code_redemptions_code")
                            .from(GiftCodeRedemptions::Table, GiftCodeRedemptions::GiftCodeId)
                            .to(GiftCodes::Table, GiftCodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_gift_code_redemptions_user")
                            .from(GiftCodeRedemptions::Table, GiftCodeRedemptions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一用户对同一礼品码只能兑换一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gift_code_redemptions_unique")
                    .table(GiftCodeRedemptions::Table)
                    .col(GiftCodeRedemptions::GiftCodeId)
                    .col(GiftCodeRedemptions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 活动
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(&mut id_column(Events::Id))
                    .col(ColumnDef::new(Events::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Events::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::Location).string_len(255).null())
                    .col(ColumnDef::new(Events::Category).string_len(64).null())
                    .col(
                        ColumnDef::new(Events::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Events::Image).text().null())
                    .col(
                        ColumnDef::new(Events::IsHero)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at_column(Events::CreatedAt))
                    .col(&mut created_at_column(Events::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventAttendees::Table)
                    .if_not_exists()
                    .col(&mut id_column(EventAttendees::Id))
                    .col(ColumnDef::new(EventAttendees::EventId).big_integer().not_null())
                    .col(ColumnDef::new(EventAttendees::UserId).big_integer().not_null())
                    .col(&mut created_at_column(EventAttendees::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_attendees_event")
                            .from(EventAttendees::Table, EventAttendees::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_attendees_user")
                            .from(EventAttendees::Table, EventAttendees::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_attendees_unique")
                    .table(EventAttendees::Table)
                    .col(EventAttendees::EventId)
                    .col(EventAttendees::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventShares::Table)
                    .if_not_exists()
                    .col(&mut id_column(EventShares::Id))
                    .col(ColumnDef::new(EventShares::EventId).big_integer().not_null())
                    .col(ColumnDef::new(EventShares::UserId).big_integer().not_null())
                    .col(&mut created_at_column(EventShares::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_shares_event")
                            .from(EventShares::Table, EventShares::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_shares_user")
                            .from(EventShares::Table, EventShares::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_shares_unique")
                    .table(EventShares::Table)
                    .col(EventShares::EventId)
                    .col(EventShares::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserLikedEvents::Table)
                    .if_not_exists()
                    .col(&mut id_column(UserLikedEvents::Id))
                    .col(ColumnDef::new(UserLikedEvents::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserLikedEvents::EventId).big_integer().not_null())
                    .col(&mut created_at_column(UserLikedEvents::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_liked_events_user")
                            .from(UserLikedEvents::Table, UserLikedEvents::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_liked_events_event")
                            .from(UserLikedEvents::Table, UserLikedEvents::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_liked_events_unique")
                    .table(UserLikedEvents::Table)
                    .col(UserLikedEvents::UserId)
                    .col(UserLikedEvents::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 每个用户对同一活动只保留一条评分，重复评分覆盖
        manager
            .create_table(
                Table::create()
                    .table(EventRatings::Table)
                    .if_not_exists()
                    .col(&mut id_column(EventRatings::Id))
                    .col(ColumnDef::new(EventRatings::EventId).big_integer().not_null())
                    .col(ColumnDef::new(EventRatings::UserId).big_integer().not_null())
                    .col(ColumnDef::new(EventRatings::Rating).integer().not_null())
                    .col(&mut created_at_column(EventRatings::CreatedAt))
                    .col(&mut created_at_column(EventRatings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_ratings_event")
                            .from(EventRatings::Table, EventRatings::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_ratings_user")
                            .from(EventRatings::Table, EventRatings::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_ratings_unique")
                    .table(EventRatings::Table)
                    .col(EventRatings::EventId)
                    .col(EventRatings::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 课程
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(&mut id_column(Classes::Id))
                    .col(ColumnDef::new(Classes::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Classes::Instructor).string_len(255).null())
                    .col(ColumnDef::new(Classes::ContactPhone).string_len(32).null())
                    .col(ColumnDef::new(Classes::Day).string_len(32).null())
                    .col(ColumnDef::new(Classes::Time).string_len(32).null())
                    .col(ColumnDef::new(Classes::Location).string_len(255).null())
                    .col(
                        ColumnDef::new(Classes::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Classes::AgeGroup).string_len(64).null())
                    .col(ColumnDef::new(Classes::Image).text().null())
                    .col(ColumnDef::new(Classes::Category).string_len(64).null())
                    .col(&mut created_at_column(Classes::CreatedAt))
                    .col(&mut created_at_column(Classes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // 抽奖
        manager
            .create_table(
                Table::create()
                    .table(Lotteries::Table)
                    .if_not_exists()
                    .col(&mut id_column(Lotteries::Id))
                    .col(ColumnDef::new(Lotteries::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Lotteries::Prize).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Lotteries::DrawDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Lotteries::Image).text().null())
                    .col(
                        ColumnDef::new(Lotteries::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Lotteries::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Lotteries::WinnerId).big_integer().null())
                    .col(
                        ColumnDef::new(Lotteries::EligibilityType)
                            .string_len(16)
                            .not_null()
                            .default("all"),
                    )
                    .col(
                        ColumnDef::new(Lotteries::MinPointsToEnter)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Lotteries::MinLevel).string_len(16).null())
                    .col(ColumnDef::new(Lotteries::SpecificUserId).big_integer().null())
                    .col(
                        ColumnDef::new(Lotteries::DrawnAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut created_at_column(Lotteries::CreatedAt))
                    .col(&mut created_at_column(Lotteries::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryParticipants::Table)
                    .if_not_exists()
                    .col(&mut id_column(LotteryParticipants::Id))
                    .col(
                        ColumnDef::new(LotteryParticipants::LotteryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryParticipants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(&mut created_at_column(LotteryParticipants::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lottery_participants_lottery")
                            .from(LotteryParticipants::Table, LotteryParticipants::LotteryId)
                            .to(Lotteries::Table, Lotteries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lottery_participants_user")
                            .from(LotteryParticipants::Table, LotteryParticipants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户在同一抽奖中只能出现一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lottery_participants_unique")
                    .table(LotteryParticipants::Table)
                    .col(LotteryParticipants::LotteryId)
                    .col(LotteryParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 先删子表再删主表
        manager
            .drop_table(Table::drop().if_exists().table(LotteryParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Lotteries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(EventRatings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(UserLikedEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(EventShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(EventAttendees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(GiftCodeRedemptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(GiftCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PointTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(AppSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
