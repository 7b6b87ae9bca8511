use crate::dto::{AuthToken, ResponseData, RESPONSE_INTERNAL_ERROR, RESPONSE_OK, RESPONSE_UNAUTHORIZED};
use crate::pool::{Db, MuseumConfig};
use hmac::{Hmac, Mac};
use jwt::token::verified::VerifyWithKey;
use jwt::SignWithKey;
use museum_db_entity::db::{museum_slot, user_data};
use rocket::{serde::json::Json, State};
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use sea_orm_rocket::Connection;
use sha2::Sha256;
use std::{collections::BTreeMap, str::FromStr};
use tracing::{info, warn};

/// Wallet-signature login. Verifies the ed25519 signature over `message`,
/// provisions a fresh user (with the initial slot set) on first sight of
/// the wallet, and hands back a JWT for the mutating endpoints.
#[get("/auth/login?<wallet>&<message>&<signature>", format = "application/json")]
pub async fn login(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    wallet: String,
    message: String,
    signature: String,
) -> Json<ResponseData<String>> {
    match verify_wallet_signature(&wallet, &message, &signature).await {
        Ok(is_verified) => {
            if !is_verified {
                return Json(ResponseData::new(
                    RESPONSE_UNAUTHORIZED,
                    "Signature verification failed".to_owned(),
                    None,
                ));
            }

            let db = conn.into_inner();
            if let Err(error) = provision_user(db, &wallet, museum_config.initial_slots).await {
                warn!("Could not provision user {}: {}", wallet, error);
                return Json(ResponseData::new(RESPONSE_INTERNAL_ERROR, error, None));
            }

            match generate_jwt_token(&wallet, &message, &signature, &museum_config.jwt_key).await {
                Ok(jwt_token) => Json(ResponseData::new(
                    RESPONSE_OK,
                    "".to_owned(),
                    Some(jwt_token),
                )),
                Err(error) => Json(ResponseData::new(RESPONSE_INTERNAL_ERROR, error, None)),
            }
        }
        Err(error) => Json(ResponseData::new(RESPONSE_UNAUTHORIZED, error, None)),
    }
}

#[get("/auth/verify?<wallet>&<jwt_token>", format = "application/json")]
pub async fn verify(
    museum_config: &State<MuseumConfig>,
    wallet: String,
    jwt_token: String,
) -> Json<ResponseData<String>> {
    let status = if verify_jwt_token(&museum_config.jwt_key, &wallet, &jwt_token).await {
        "successful".to_owned()
    } else {
        "failed".to_owned()
    };
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(status)))
}

/// Guard used by the mutating routes: the bearer JWT must have been issued
/// for the wallet the request operates on.
pub async fn authorize(
    jwt_key: &str,
    wallet: &str,
    auth_token: &AuthToken<'_>,
) -> Result<(), (u16, String)> {
    if verify_jwt_token(jwt_key, wallet, auth_token.token()).await {
        Ok(())
    } else {
        Err((
            RESPONSE_UNAUTHORIZED,
            "Invalid or expired token".to_owned(),
        ))
    }
}

/// Creates the user row (level 1, empty balances) and its initial slots if
/// the wallet has never logged in before.
async fn provision_user(
    db: &DatabaseConnection,
    wallet: &str,
    initial_slots: i32,
) -> Result<(), String> {
    let existing = user_data::Entity::find()
        .filter(user_data::Column::WalletAddress.eq(wallet))
        .one(db)
        .await
        .map_err(|error| error.to_string())?;
    if existing.is_some() {
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp();
    let user = user_data::ActiveModel {
        id: ActiveValue::NotSet,
        wallet_address: ActiveValue::Set(wallet.to_owned()),
        museum_pass_mint: ActiveValue::Set(None),
        level: ActiveValue::Set(1),
        xp: ActiveValue::Set(0),
        museum_balance: ActiveValue::Set(0),
        stoned_balance: ActiveValue::Set(0),
        staking_pool: ActiveValue::Set("none".to_owned()),
        staking_amount: ActiveValue::Set(0),
        staking_started_at: ActiveValue::Set(None),
        created_at: ActiveValue::Set(now),
    };
    let inserted = user_data::Entity::insert(user)
        .exec(db)
        .await
        .map_err(|error| error.to_string())?;

    for slot_number in 1..=initial_slots {
        let slot = museum_slot::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(inserted.last_insert_id),
            slot_number: ActiveValue::Set(slot_number),
            artwork_mint: ActiveValue::Set(None),
            unlocked_at: ActiveValue::Set(now),
        };
        museum_slot::Entity::insert(slot)
            .exec(db)
            .await
            .map_err(|error| error.to_string())?;
    }

    info!("Provisioned user {} with {} slots", wallet, initial_slots);
    Ok(())
}

async fn verify_wallet_signature(
    wallet: &str,
    message: &str,
    signature: &str,
) -> Result<bool, String> {
    let wallet_decoded = match bs58::decode(&wallet).into_vec() {
        Ok(pkey) => pkey,
        Err(error) => {
            warn!("wallet decode error: {}", error);
            return Err("Key decoding failed".to_string());
        }
    };
    let pubkey = match ed25519_dalek::PublicKey::from_bytes(&wallet_decoded) {
        Ok(pubkey) => pubkey,
        Err(error) => {
            warn!("Invalid pubkey: {}", error);
            return Err("Not valid user wallet key".to_string());
        }
    };

    let signature = match bs58::decode(signature).into_vec() {
        Ok(signature_decode) => signature_decode,
        Err(error) => {
            warn!("signature decode error: {}", error);
            return Err("Signature decoding failed".to_string());
        }
    };

    let signature = match ed25519_dalek::Signature::from_bytes(&signature) {
        Ok(signature) => signature,
        Err(error) => {
            warn!("Bad signature: {}", error);
            return Err("Not valid signature".to_string());
        }
    };

    Ok(pubkey.verify_strict(message.as_bytes(), &signature).is_ok())
}

async fn generate_jwt_token(
    wallet: &str,
    message: &str,
    signature: &str,
    jwt_key: &str,
) -> Result<String, String> {
    let key: Hmac<Sha256> = match Hmac::new_from_slice(jwt_key.as_bytes()) {
        Ok(key) => key,
        Err(error) => {
            warn!("Invalid key: {}", error);
            return Err("Invalid key".to_string());
        }
    };
    let mut claims: BTreeMap<&str, &str> = BTreeMap::new();
    claims.insert("pubkey", wallet);
    claims.insert("message", message);
    claims.insert("signature", signature);

    let expiry = chrono::Local::now()
        .checked_add_days(chrono::Days::new(1))
        .unwrap()
        .to_string();

    claims.insert("expiry", &expiry);

    match claims.sign_with_key(&key) {
        Ok(jwt_token) => Ok(jwt_token),
        Err(error) => Err(error.to_string()),
    }
}

async fn verify_jwt_token(jwt_key: &str, wallet: &str, jwt_token: &str) -> bool {
    let key: Hmac<Sha256> = match Hmac::new_from_slice(jwt_key.as_bytes()) {
        Ok(key) => key,
        Err(error) => {
            warn!("Faulty JWT key: {}", error);
            return false;
        }
    };
    let claims: BTreeMap<String, String> = match jwt_token.verify_with_key(&key) {
        Ok(claims) => claims,
        Err(error) => {
            info!("JWT verification error: {}", error);
            warn!("Invalid JWT token passed!");
            return false;
        }
    };
    if !claims["pubkey"].eq(wallet) {
        info!("Wrong pubkey in JWT token");
        return false;
    }

    let expiry: chrono::DateTime<chrono::Local> =
        match chrono::DateTime::from_str(&claims["expiry"]) {
            Ok(expiry) => expiry,
            Err(error) => {
                warn!("Bad expiry string: {}", error);
                return false;
            }
        };
    let now = chrono::Local::now();
    if now.le(&expiry) {
        true
    } else {
        info!("JWT token is expired");
        false
    }
}
