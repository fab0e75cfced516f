use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        repo_types::{Role, User},
        services::authorize,
    },
    bootcamps::{
        dto::{CreateBootcampRequest, PageLink, PageQuery, Pagination, MAX_PAGE_LIMIT},
        repo_types::{Bootcamp, NewBootcamp},
    },
    error::{AppError, AppResult},
    state::AppState,
};

/// Highest page whose row offset still fits in an `i64` at any allowed limit.
const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT - 1;

/// Clamped `(page, limit)`; page is 1-based.
pub fn normalize_page(query: &PageQuery) -> (i64, i64) {
    (
        query.page.clamp(1, MAX_PAGE),
        query.limit.clamp(1, MAX_PAGE_LIMIT),
    )
}

/// `next` while rows remain past this page, `prev` for any page after the first.
pub fn paginate(page: i64, limit: i64, total: i64) -> Pagination {
    let start = (page - 1) * limit;
    let end = page * limit;
    Pagination {
        next: (end < total).then_some(PageLink { page: page + 1, limit }),
        prev: (start > 0).then_some(PageLink { page: page - 1, limit }),
    }
}

pub async fn list_bootcamps(
    state: &AppState,
    query: &PageQuery,
) -> AppResult<(Vec<Bootcamp>, Pagination)> {
    let (page, limit) = normalize_page(query);
    let total = state.bootcamps.count().await?;
    let rows = state.bootcamps.list(limit, (page - 1) * limit).await?;
    Ok((rows, paginate(page, limit, total)))
}

pub async fn get_bootcamp(state: &AppState, id: Uuid) -> AppResult<Bootcamp> {
    state
        .bootcamps
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No bootcamp with the id of {id}")))
}

pub async fn create_bootcamp(
    state: &AppState,
    user: &User,
    payload: CreateBootcampRequest,
) -> AppResult<Bootcamp> {
    authorize(user, &[Role::Publisher, Role::Admin])?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Please add a name"));
    }
    if name.chars().count() > 50 {
        return Err(AppError::validation("Name can not be more than 50 characters"));
    }
    let description = payload.description.trim().to_string();
    if description.is_empty() {
        return Err(AppError::validation("Please add a description"));
    }

    let bootcamp = state
        .bootcamps
        .create(NewBootcamp {
            name,
            description,
            website: payload.website.filter(|w| !w.trim().is_empty()),
            user_id: user.id,
        })
        .await?;
    info!(bootcamp_id = %bootcamp.id, user_id = %user.id, "bootcamp created");
    Ok(bootcamp)
}

/// Owner or admin only. Reviews go first so none outlive their bootcamp.
pub async fn delete_bootcamp(state: &AppState, user: &User, id: Uuid) -> AppResult<()> {
    let bootcamp = get_bootcamp(state, id).await?;
    if bootcamp.user_id != user.id && user.role != Role::Admin {
        warn!(user_id = %user.id, bootcamp_id = %id, "bootcamp delete denied");
        return Err(AppError::forbidden(format!(
            "User {} is not authorized to delete this bootcamp",
            user.id
        )));
    }

    let removed_reviews = state.reviews.delete_by_bootcamp(id).await?;
    if !state.bootcamps.delete(id).await? {
        return Err(AppError::not_found(format!("No bootcamp with the id of {id}")));
    }
    info!(bootcamp_id = %id, removed_reviews, "bootcamp deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::NewUser;
    use crate::bootcamps::dto::DEFAULT_PAGE_LIMIT;
    use crate::testing::{seed_bootcamp, seed_review};

    #[test]
    fn pagination_links() {
        assert_eq!(paginate(1, 6, 0), Pagination::default());
        assert_eq!(paginate(1, 6, 6), Pagination::default());

        let first = paginate(1, 6, 13);
        assert_eq!(first.next, Some(PageLink { page: 2, limit: 6 }));
        assert_eq!(first.prev, None);

        let middle = paginate(2, 6, 13);
        assert_eq!(middle.next, Some(PageLink { page: 3, limit: 6 }));
        assert_eq!(middle.prev, Some(PageLink { page: 1, limit: 6 }));

        let last = paginate(3, 6, 13);
        assert_eq!(last.next, None);
        assert_eq!(last.prev, Some(PageLink { page: 2, limit: 6 }));
    }

    #[test]
    fn page_query_is_clamped() {
        assert_eq!(normalize_page(&PageQuery { page: 0, limit: 0 }), (1, 1));
        assert_eq!(normalize_page(&PageQuery { page: 3, limit: 500 }), (3, MAX_PAGE_LIMIT));
        assert_eq!(
            normalize_page(&PageQuery { page: i64::MAX, limit: i64::MAX }),
            (MAX_PAGE, MAX_PAGE_LIMIT)
        );
    }

    #[tokio::test]
    async fn huge_page_number_lists_nothing() {
        let state = AppState::fake();
        seed_bootcamp(state.bootcamps.as_ref(), "Only Camp").await;

        let (rows, pagination) = list_bootcamps(
            &state,
            &PageQuery {
                page: i64::MAX,
                limit: DEFAULT_PAGE_LIMIT,
            },
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
        assert_eq!(pagination.next, None);
        assert_eq!(
            pagination.prev,
            Some(PageLink {
                page: MAX_PAGE - 1,
                limit: DEFAULT_PAGE_LIMIT
            })
        );
    }

    async fn user_with_role(state: &AppState, email: &str, role: Role) -> User {
        state
            .users
            .create(NewUser {
                name: "Test".into(),
                email: email.into(),
                password_hash: "unused".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn delete_is_owner_or_admin_and_takes_reviews_along() {
        let state = AppState::fake();
        let owner = user_with_role(&state, "owner@example.com", Role::Publisher).await;
        let rival = user_with_role(&state, "rival@example.com", Role::Publisher).await;
        let admin = user_with_role(&state, "admin@example.com", Role::Admin).await;

        let bootcamp = create_bootcamp(
            &state,
            &owner,
            CreateBootcampRequest {
                name: "Devworks".into(),
                description: "Full stack".into(),
                website: None,
            },
        )
        .await
        .unwrap();
        seed_review(state.reviews.as_ref(), bootcamp.id, 9).await;

        let err = delete_bootcamp(&state, &rival, bootcamp.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(state.bootcamps.find_by_id(bootcamp.id).await.unwrap().is_some());
        assert_eq!(state.reviews.list_by_bootcamp(bootcamp.id).await.unwrap().len(), 1);

        delete_bootcamp(&state, &admin, bootcamp.id).await.unwrap();
        assert!(state.bootcamps.find_by_id(bootcamp.id).await.unwrap().is_none());
        assert!(state.reviews.list_by_bootcamp(bootcamp.id).await.unwrap().is_empty());

        let err = delete_bootcamp(&state, &owner, bootcamp.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
