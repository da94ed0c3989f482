use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use catsocial_db::{
    CatFilter,
    models::{CatFields, CatRow},
};
use catsocial_types::{
    api::{CatCreatedResponse, CatListQuery, CatPayload, CatResponse, Claims, Envelope, IdResponse},
    models::{AgeComparison, Race, Sex},
};
use tracing::info;

use crate::{
    ApiError, AppState,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::run_blocking,
    validation::{FieldErrors, char_len_between, is_url},
};

pub const DEFAULT_PAGE_SIZE: u32 = 5;
const MAX_AGE_IN_MONTH: i64 = 120_082;

pub(crate) fn to_response(row: CatRow) -> CatResponse {
    CatResponse {
        id: row.id.to_string(),
        name: row.name,
        race: row.race,
        sex: row.sex,
        age_in_month: row.age_in_month,
        description: row.description,
        image_urls: row.image_urls,
        has_matched: row.has_matched,
        created_at: row.created_at,
    }
}

/// Check a create/update body and convert it to storable fields.
fn validate_payload(payload: CatPayload) -> Result<CatFields, ApiError> {
    let mut errors = FieldErrors::default();

    errors.check("name", char_len_between(&payload.name, 1, 30), "must be 1-30 characters");
    let known: Vec<&str> = Race::ALL.iter().map(Race::as_str).collect();
    let race = errors.parse::<Race>("race", &payload.race, &format!("must be one of: {}", known.join(", ")));
    let sex = errors.parse::<Sex>("sex", &payload.sex, "must be male or female");
    errors.check(
        "ageInMonth",
        (1..=MAX_AGE_IN_MONTH).contains(&payload.age_in_month),
        "must be between 1 and 120082",
    );
    errors.check(
        "description",
        char_len_between(&payload.description, 1, 200),
        "must be 1-200 characters",
    );
    errors.check("imageUrls", !payload.image_urls.is_empty(), "must not be empty");
    errors.check(
        "imageUrls",
        payload.image_urls.iter().all(|u| is_url(u)),
        "must contain only valid URLs",
    );

    // `None` here always comes with a recorded problem.
    let (Some(race), Some(sex)) = (race, sex) else {
        return Err(errors.into_error());
    };
    errors.finish()?;

    Ok(CatFields {
        name: payload.name,
        race,
        sex,
        age_in_month: payload.age_in_month,
        description: payload.description,
        image_urls: payload.image_urls,
    })
}

/// Translate query-string filters into a `CatFilter` for `caller`.
fn build_filter(query: CatListQuery, caller: i64) -> Result<CatFilter, ApiError> {
    let mut errors = FieldErrors::default();

    let id = errors.parse_opt::<i64>("id", query.id.as_deref(), "must be a numeric id");
    let race = errors.parse_opt::<Race>("race", query.race.as_deref(), "is not a known race");
    let sex = errors.parse_opt::<Sex>("sex", query.sex.as_deref(), "must be male or female");
    let age = errors.parse_opt::<AgeComparison>(
        "ageInMonth",
        query.age_in_month.as_deref(),
        "must look like N, =N, <N or >N",
    );

    let limit = match query.limit {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) => u32::try_from(n).unwrap_or_else(|_| {
            errors.add("limit", "must be a non-negative integer");
            DEFAULT_PAGE_SIZE
        }),
    };
    let offset = match query.offset {
        None => 0,
        Some(n) => u32::try_from(n).unwrap_or_else(|_| {
            errors.add("offset", "must be a non-negative integer");
            0
        }),
    };

    errors.finish()?;

    Ok(CatFilter {
        id,
        owner_id: query.owned.unwrap_or(false).then_some(caller),
        race,
        sex,
        has_matched: query.has_matched,
        age,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        limit: Some(limit),
        offset,
    })
}

pub async fn list_cats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<CatListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = build_filter(query, claims.sub)?;
    let rows = run_blocking(&state, move |s| Ok(s.db.list_cats(&filter)?)).await?;

    let data: Vec<CatResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(Envelope::success(data)))
}

pub async fn create_cat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<CatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = validate_payload(payload)?;
    let owner_id = claims.sub;
    let cat = run_blocking(&state, move |s| Ok(s.db.insert_cat(owner_id, &fields)?)).await?;

    info!("User {} created cat {}", owner_id, cat.id);
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(CatCreatedResponse {
            id: cat.id.to_string(),
            created_at: cat.created_at,
        })),
    ))
}

pub async fn update_cat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = validate_payload(payload)?;
    let owner_id = claims.sub;
    let cat = run_blocking(&state, move |s| {
        s.db.update_cat(id, owner_id, &fields)
            .map_err(|e| ApiError::or_not_found(e, "no cat found"))
    })
    .await?;

    info!("User {} updated cat {}", owner_id, id);
    Ok(Json(Envelope::success(to_response(cat))))
}

pub async fn delete_cat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = claims.sub;
    run_blocking(&state, move |s| {
        s.db.delete_cat(id, owner_id)
            .map_err(|e| ApiError::or_not_found(e, "no cat found"))
    })
    .await?;

    info!("User {} deleted cat {}", owner_id, id);
    Ok(Json(Envelope::success(IdResponse { id: id.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CatPayload {
        CatPayload {
            name: "Tom".into(),
            race: "Maine Coon".into(),
            sex: "male".into(),
            age_in_month: 12,
            description: "Likes boxes".into(),
            image_urls: vec!["https://img.example.com/tom.png".into()],
        }
    }

    #[test]
    fn valid_payload_converts() {
        let fields = validate_payload(payload()).unwrap();
        assert_eq!(fields.race, Race::MaineCoon);
        assert_eq!(fields.sex, Sex::Male);
    }

    #[test]
    fn every_problem_is_reported() {
        let bad = CatPayload {
            name: String::new(),
            race: "Tabby".into(),
            sex: "unknown".into(),
            age_in_month: 0,
            description: "x".repeat(201),
            image_urls: vec!["nope".into()],
        };
        let msg = validate_payload(bad).unwrap_err().to_string();
        for field in ["name", "race", "sex", "ageInMonth", "description", "imageUrls"] {
            assert!(msg.contains(field), "{field} missing from {msg}");
        }
    }

    #[test]
    fn bad_sex_alone_is_a_validation_error() {
        let mut p = payload();
        p.sex = "Male".into();
        let err = validate_payload(p).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "sex must be male or female");
    }

    #[test]
    fn empty_image_list_is_rejected() {
        let mut p = payload();
        p.image_urls.clear();
        assert!(validate_payload(p).is_err());
    }

    #[test]
    fn age_bounds() {
        let mut p = payload();
        p.age_in_month = MAX_AGE_IN_MONTH;
        assert!(validate_payload(p).is_ok());

        let mut p = payload();
        p.age_in_month = MAX_AGE_IN_MONTH + 1;
        assert!(validate_payload(p).is_err());
    }

    #[test]
    fn filter_defaults() {
        let filter = build_filter(CatListQuery::default(), 3).unwrap();
        assert_eq!(filter.limit, Some(DEFAULT_PAGE_SIZE));
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.owner_id, None);
        assert!(filter.age.is_none());
    }

    #[test]
    fn filter_parses_values() {
        let query = CatListQuery {
            id: Some("9".into()),
            limit: Some(10),
            offset: Some(20),
            race: Some("Bengal".into()),
            sex: Some("female".into()),
            has_matched: Some(false),
            age_in_month: Some(">=6".into()),
            owned: Some(true),
            search: Some("  tom ".into()),
        };
        let filter = build_filter(query, 3).unwrap();
        assert_eq!(filter.id, Some(9));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, 20);
        assert_eq!(filter.race, Some(Race::Bengal));
        assert_eq!(filter.sex, Some(Sex::Female));
        assert_eq!(filter.has_matched, Some(false));
        assert_eq!(filter.age, Some(AgeComparison::AtLeast(6)));
        assert_eq!(filter.owner_id, Some(3));
        assert_eq!(filter.search.as_deref(), Some("tom"));
    }

    #[test]
    fn invalid_filters_are_rejected() {
        let query = CatListQuery {
            id: Some("abc".into()),
            limit: Some(-1),
            age_in_month: Some("=>4".into()),
            ..CatListQuery::default()
        };
        let msg = build_filter(query, 3).unwrap_err().to_string();
        assert!(msg.contains("id"));
        assert!(msg.contains("limit"));
        assert!(msg.contains("ageInMonth"));
    }
}
