use crate::dto::{
    AuthToken, ConvertOutcome, ConvertRequest, ResponseData, DB_ERROR_MESSAGE,
    RESPONSE_INTERNAL_ERROR, RESPONSE_OK,
};
use crate::pool::{Db, MuseumConfig};
use museum_db_entity::db::conversion;
use museum_reward::RewardError;
use rocket::{serde::json::Json, State};
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectionTrait, Statement, TransactionTrait};
use sea_orm_rocket::Connection;
use tracing::{error, info, warn};

/// Converts spendable $MUSEUM into $STONED at the configured rate. Only
/// whole $STONED are minted; the remainder below one unit stays on the
/// $MUSEUM balance.
#[post("/convert", format = "application/json", data = "<convert_request>")]
pub async fn convert(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    convert_request: Json<ConvertRequest>,
) -> Json<ResponseData<ConvertOutcome>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &convert_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let rate = museum_config.conversion_rate;
    if convert_request.museum_amount < rate {
        return Json(ResponseData::rejected(&RewardError::validation(format!(
            "Minimum conversion is {} $MUSEUM",
            rate
        ))));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &convert_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let stoned_amount = convert_request.museum_amount / rate;
    let museum_spent = stoned_amount * rate;

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(error) => {
            error!("Error opening conversion transaction: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let result = match txn
        .execute(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::CONVERT_BALANCE,
            vec![user.id.into(), museum_spent.into(), stoned_amount.into()],
        ))
        .await
    {
        Ok(result) => result,
        Err(error) => {
            error!("Error converting balance for {}: {:?}", user.id, error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };
    if result.rows_affected() == 0 {
        if let Err(error) = txn.rollback().await {
            warn!("Rollback failed: {:?}", error);
        }
        // the guarded UPDATE only misses when the balance no longer covers it
        return Json(ResponseData::rejected(&RewardError::InsufficientBalance {
            required: museum_spent,
            available: user.museum_balance,
        }));
    }

    let record = conversion::ActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(user.id),
        museum_amount: ActiveValue::Set(museum_spent),
        stoned_amount: ActiveValue::Set(stoned_amount),
        rate: ActiveValue::Set(rate as i32),
        created_at: ActiveValue::Set(chrono::Utc::now().timestamp()),
    };
    if let Err(error) = record.insert(&txn).await {
        error!("Error recording conversion for {}: {:?}", user.id, error);
        if let Err(error) = txn.rollback().await {
            warn!("Rollback failed: {:?}", error);
        }
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    if let Err(error) = txn.commit().await {
        error!("Error committing conversion: {:?}", error);
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    info!(
        "User {} converted {} $MUSEUM into {} $STONED",
        user.id, museum_spent, stoned_amount
    );
    Json(ResponseData::new(
        RESPONSE_OK,
        "".to_owned(),
        Some(ConvertOutcome {
            museum_amount: museum_spent,
            stoned_amount,
            rate,
        }),
    ))
}
