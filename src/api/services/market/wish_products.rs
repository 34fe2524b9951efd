//! 许愿商品端点

use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, info};

use crate::errors::{BiMarketError, Result};
use crate::services::validation::{WishProductInput, parse_date_bound};
use crate::services::{AppServices, CreateWishRequest, PublicListQuery, WishListQuery};
use crate::storage::{SortOrder, WishProduct, WishProductSort, WishSortField, WishStatus};

use super::helpers::{
    MultipartLimits, api_result, created_response, error_from_bimarket, guest_id, read_multipart,
};
use super::types::{
    CreatedWish, LikeResponse, PaginatedItems, Pagination, PublicListParams, PublicListResponse,
    WishListParams,
};

/// 解析排序；不在 `allowed` 中的字段回落到 createdAt
pub(super) fn parse_sort(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
    allowed: &[WishSortField],
) -> WishProductSort {
    let field = sort_by
        .and_then(|s| WishSortField::from_str(s).ok())
        .filter(|f| allowed.contains(f))
        .unwrap_or_default();
    let order = sort_order
        .and_then(|s| SortOrder::from_str(s).ok())
        .unwrap_or_default();
    WishProductSort { field, order }
}

fn parse_list_query(params: WishListParams) -> Result<WishListQuery> {
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            WishStatus::from_str(s)
                .map_err(|_| BiMarketError::validation(format!("無效的狀態: {}", s)))
        })
        .transpose()?;

    let start_date = params
        .start_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_bound(s, false))
        .transpose()?;
    let end_date = params
        .end_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_bound(s, true))
        .transpose()?;

    Ok(WishListQuery {
        category_id: params.category,
        status,
        start_date,
        end_date,
        sort: parse_sort(
            params.sort_by.as_deref(),
            params.sort_order.as_deref(),
            &[
                WishSortField::CreatedAt,
                WishSortField::UpdatedAt,
                WishSortField::Name,
            ],
        ),
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(10),
    })
}

/// POST /api/wish-products（multipart）
pub async fn create_wish_product(
    req: HttpRequest,
    payload: Multipart,
    services: web::Data<AppServices>,
) -> impl Responder {
    let config = services.uploads.config();
    let limits = MultipartLimits {
        file_field: "images",
        max_files: config.max_images,
        max_file_size: config.max_file_size,
    };
    let form = match read_multipart(payload, limits).await {
        Ok(form) => form,
        Err(e) => return error_from_bimarket(&e),
    };

    let input = WishProductInput {
        name: form.text("name"),
        description: form.text("description"),
        category_id: form.text("categoryId"),
        region: form.text("region"),
        additional_info: form.text("additionalInfo"),
        expected_price: form.text("expectedPrice"),
        currency: form.text("currency"),
    };
    let request = CreateWishRequest {
        input,
        images: form.files,
        user_id: guest_id(&req),
    };

    match services.wish_products.create(request).await {
        Ok(product) => {
            info!("API: wish product created {}", product.id);
            created_response(CreatedWish {
                id: product.id,
                message: "許願商品提交成功".to_string(),
            })
        }
        Err(e) => error_from_bimarket(&e),
    }
}

async fn list_page(
    params: WishListParams,
    services: &AppServices,
) -> Result<PaginatedItems<WishProduct>> {
    let query = parse_list_query(params)?;
    let page = services.wish_products.list(query).await?;
    Ok(PaginatedItems {
        pagination: Pagination {
            total: page.total,
            page: page.page,
            limit: page.page_size,
            total_pages: page.total_pages(),
        },
        items: page.items,
    })
}

/// GET /api/wish-products
pub async fn list_wish_products(
    query: web::Query<WishListParams>,
    services: web::Data<AppServices>,
) -> impl Responder {
    api_result(list_page(query.into_inner(), &services).await)
}

/// GET /api/wish-products/{id}
pub async fn get_wish_product(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    api_result(services.wish_products.get(&path.into_inner()).await)
}

/// POST /api/wish-products/{id}/like
pub async fn like_wish_product(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    api_result(
        services
            .wish_products
            .like(&path.into_inner())
            .await
            .map(|like_count| LikeResponse { like_count }),
    )
}

/// GET /api/wish-products-list
///
/// 公开列表，不使用信封；失败时返回 `{error}`。
pub async fn public_wish_list(
    query: web::Query<PublicListParams>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let params = query.into_inner();
    let query = PublicListQuery {
        category_id: params.category,
        min_price: params.min_price,
        max_price: params.max_price,
        sort: parse_sort(
            params.sort_by.as_deref(),
            params.sort_order.as_deref(),
            &[
                WishSortField::CreatedAt,
                WishSortField::WishCount,
                WishSortField::ExpectedPrice,
            ],
        ),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(20),
    };

    match services.wish_products.public_list(query).await {
        Ok(page) => {
            let total_pages = page.total_pages();
            HttpResponse::Ok().json(PublicListResponse {
                data: page.items,
                total: page.total,
                page: page.page,
                page_size: page.page_size,
                total_pages,
            })
        }
        Err(e) => {
            error!("Error fetching wish products: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch wish products" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_falls_back() {
        let allowed = [WishSortField::CreatedAt, WishSortField::Name];
        let sort = parse_sort(Some("name"), Some("ASC"), &allowed);
        assert_eq!(sort.field, WishSortField::Name);
        assert_eq!(sort.order, SortOrder::Asc);

        let sort = parse_sort(Some("wishCount"), Some("sideways"), &allowed);
        assert_eq!(sort.field, WishSortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn test_parse_list_query() {
        let params = WishListParams {
            status: Some("Processing".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let query = parse_list_query(params).unwrap();
        assert_eq!(query.status, Some(WishStatus::Processing));
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(query.start_date.unwrap() < query.end_date.unwrap());

        let bad = WishListParams {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(parse_list_query(bad).is_err());
    }
}
