use crate::dto::{ProfileDetails, ResponseData, RESPONSE_OK};
use crate::pool::Db;
use rocket::serde::json::Json;
use sea_orm_rocket::Connection;

#[get("/profile?<wallet>", format = "application/json")]
pub async fn get_profile(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<ProfileDetails>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let details = ProfileDetails {
        wallet_address: user.wallet_address,
        museum_pass_mint: user.museum_pass_mint,
        level: user.level,
        xp: user.xp,
        museum_balance: user.museum_balance,
        stoned_balance: user.stoned_balance,
        staking_pool: user.staking_pool,
        staking_amount: user.staking_amount,
        staking_started_at: user.staking_started_at,
    };
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(details)))
}
