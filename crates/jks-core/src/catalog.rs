//! Client-side catalog query: search, category, offer/sort/range, paging.
//!
//! The whole product list is fetched once and every view is computed from it
//! in memory. Steps run in a fixed order: text search, category, offer
//! filter, then either a price sort or a price range, all on the discounted
//! price.

use serde::Serialize;

use crate::products::{Category, Product};
use crate::CoreError;

/// Products shown per catalog page.
pub const PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl std::str::FromStr for CategoryFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<Category>().map(CategoryFilter::Only)
        }
    }
}

/// The catalog's sort/range selector.
///
/// Parsed from the selector values `default`, `price-low`, `price-high`,
/// `offer`, and `range-MIN-MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Default,
    PriceLowToHigh,
    PriceHighToLow,
    /// Only products with a positive discount, in fetched order.
    Offer,
    /// Discounted price within `[min, max]`, inclusive, in fetched order.
    Range { min: i64, max: i64 },
}

impl std::str::FromStr for SortOption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" => Ok(SortOption::Default),
            "price-low" => Ok(SortOption::PriceLowToHigh),
            "price-high" => Ok(SortOption::PriceHighToLow),
            "offer" => Ok(SortOption::Offer),
            other => parse_range(other).ok_or_else(|| CoreError::InvalidSortOption(s.to_string())),
        }
    }
}

fn parse_range(raw: &str) -> Option<SortOption> {
    let (min, max) = raw.strip_prefix("range-")?.split_once('-')?;
    let min = min.parse::<i64>().ok()?;
    let max = max.parse::<i64>().ok()?;
    (min <= max).then_some(SortOption::Range { min, max })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortOption,
}

/// Applies the catalog query to the full product list, returning a new list.
#[must_use]
pub fn filter_and_sort(products: &[Product], query: &CatalogQuery) -> Vec<Product> {
    let needle = query.search.trim().to_lowercase();

    let mut list: Vec<Product> = products
        .iter()
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .filter(|p| match query.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(cat) => p.category == Some(cat),
        })
        .cloned()
        .collect();

    match query.sort {
        SortOption::Default => {}
        SortOption::Offer => list.retain(Product::has_offer),
        SortOption::PriceLowToHigh => list.sort_by_key(Product::discounted_price),
        SortOption::PriceHighToLow => {
            list.sort_by_key(|p| std::cmp::Reverse(p.discounted_price()));
        }
        SortOption::Range { min, max } => {
            list.retain(|p| (min..=max).contains(&p.discounted_price()));
        }
    }

    list
}

/// One page of catalog results. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Number of pages for `len` items; never less than 1.
#[must_use]
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Slices one page out of an already filtered list.
///
/// A page of 0 or beyond the last page resets to page 1, which is what the
/// catalog does when a filter change shrinks the result set.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total_pages = total_pages(items.len(), page_size);
    let page = if page == 0 || page > total_pages { 1 } else { page };

    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Page {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i64, name: &str, price: i64, discount: i64, category: Category) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            min_qty: Some(1),
            category: Some(category),
            image_url: None,
            image_path: None,
            discount_percent: (discount > 0).then(|| Decimal::from(discount)),
            countdown_enabled: false,
            countdown_time: None,
            sale_end_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn sample() -> Vec<Product> {
        vec![
            product(1, "Chettinad Cotton", 900, 0, Category::Cotton),
            product(2, "Mangalagiri Cotton", 1500, 50, Category::Cotton),
            product(3, "Kanchi Pattu", 8000, 10, Category::Pattu),
            product(4, "Gadwal Silk Cotton", 3200, 0, Category::Gadwal),
            product(5, "Mysore Silk", 6000, 25, Category::Silk),
            product(6, "Party Wear Fancy", 1200, 0, Category::Fancy),
        ]
    }

    fn ids(list: &[Product]) -> Vec<i64> {
        list.iter().map(|p| p.id).collect()
    }

    #[test]
    fn sort_option_parses_selector_values() {
        assert_eq!("default".parse::<SortOption>().unwrap(), SortOption::Default);
        assert_eq!(
            "price-low".parse::<SortOption>().unwrap(),
            SortOption::PriceLowToHigh
        );
        assert_eq!(
            "price-high".parse::<SortOption>().unwrap(),
            SortOption::PriceHighToLow
        );
        assert_eq!("offer".parse::<SortOption>().unwrap(), SortOption::Offer);
        assert_eq!(
            "range-1000-3000".parse::<SortOption>().unwrap(),
            SortOption::Range {
                min: 1000,
                max: 3000
            }
        );
    }

    #[test]
    fn sort_option_rejects_garbage() {
        for raw in ["cheapest", "range-", "range-10", "range-a-b", "range-500-100"] {
            assert!(
                matches!(raw.parse::<SortOption>(), Err(CoreError::InvalidSortOption(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn category_filter_parses_all_and_categories() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Silk".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Silk)
        );
        assert!("Linen".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let list = filter_and_sort(&sample(), &CatalogQuery::default());
        assert_eq!(ids(&list), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn search_is_case_insensitive_on_name() {
        let query = CatalogQuery {
            search: "  SILK ".to_string(),
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![4, 5]);
    }

    #[test]
    fn category_filter_is_exact() {
        let query = CatalogQuery {
            category: CategoryFilter::Only(Category::Cotton),
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![1, 2]);
    }

    #[test]
    fn search_and_category_commute() {
        let products = sample();
        let search_only = CatalogQuery {
            search: "cotton".to_string(),
            ..CatalogQuery::default()
        };
        let category_only = CatalogQuery {
            category: CategoryFilter::Only(Category::Cotton),
            ..CatalogQuery::default()
        };
        let both = CatalogQuery {
            search: "cotton".to_string(),
            category: CategoryFilter::Only(Category::Cotton),
            sort: SortOption::Default,
        };

        let a = filter_and_sort(&filter_and_sort(&products, &search_only), &category_only);
        let b = filter_and_sort(&filter_and_sort(&products, &category_only), &search_only);
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(ids(&a), ids(&filter_and_sort(&products, &both)));
    }

    #[test]
    fn price_sort_uses_discounted_price() {
        // Discounted: 1=900, 2=750, 3=7200, 4=3200, 5=4500, 6=1200
        let low = CatalogQuery {
            sort: SortOption::PriceLowToHigh,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &low)), vec![2, 1, 6, 4, 5, 3]);

        let high = CatalogQuery {
            sort: SortOption::PriceHighToLow,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &high)), vec![3, 5, 4, 6, 1, 2]);
    }

    #[test]
    fn offer_keeps_discounted_products_only() {
        let query = CatalogQuery {
            sort: SortOption::Offer,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![2, 3, 5]);
    }

    #[test]
    fn range_is_inclusive_on_discounted_price_and_unsorted() {
        let query = CatalogQuery {
            sort: SortOption::Range {
                min: 750,
                max: 1200,
            },
            ..CatalogQuery::default()
        };
        // 2 costs 1500 but 750 after discount.
        assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![1, 2, 6]);
    }

    #[test]
    fn sort_applies_after_search_and_category() {
        let query = CatalogQuery {
            search: "cotton".to_string(),
            category: CategoryFilter::Only(Category::Cotton),
            sort: SortOption::PriceHighToLow,
        };
        assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![1, 2]);
    }

    #[test]
    fn total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, PAGE_SIZE), 1);
        assert_eq!(total_pages(12, PAGE_SIZE), 1);
        assert_eq!(total_pages(13, PAGE_SIZE), 2);
        assert_eq!(total_pages(25, PAGE_SIZE), 3);
    }

    #[test]
    fn pages_concatenate_back_to_the_full_list() {
        let items: Vec<usize> = (0..29).collect();
        let pages = total_pages(items.len(), 5);
        let mut joined = Vec::new();
        for page in 1..=pages {
            joined.extend(paginate(&items, page, 5).items);
        }
        assert_eq!(joined, items);
    }

    #[test]
    fn last_page_is_partial() {
        let items: Vec<usize> = (0..29).collect();
        let page = paginate(&items, 6, 5);
        assert_eq!(page.items, vec![25, 26, 27, 28]);
        assert_eq!(page.total_pages, 6);
        assert_eq!(page.total_items, 29);
    }

    #[test]
    fn out_of_range_page_resets_to_first() {
        let items: Vec<usize> = (0..7).collect();
        let page = paginate(&items, 4, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![0, 1, 2, 3, 4]);

        let zero = paginate(&items, 0, 5);
        assert_eq!(zero.page, 1);
    }

    #[test]
    fn empty_list_yields_single_empty_page() {
        let items: Vec<usize> = Vec::new();
        let page = paginate(&items, 1, PAGE_SIZE);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
