//! Page context for a listing search and the home-feed section table.

use serde::{Deserialize, Serialize};

use super::{Flags, SearchFilter};

/// How a home-feed section is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionLayout {
    PropertyCarousel,
    PropertyGrid,
    Map,
    CardStrip,
    Accordion,
}

/// Home-feed section kinds the API can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Featured,
    Premium,
    MostViewed,
    MostLiked,
    Nearby,
    ByCities,
    OnMap,
    UserRecommendations,
    FeaturedProjects,
    Projects,
    Categories,
    Agents,
    Articles,
    Faqs,
}

/// What the feed needs to render one section kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub kind: SectionKind,
    /// Section `type` string in the home-feed response
    pub api_type: &'static str,
    pub title_key: &'static str,
    pub layout: SectionLayout,
    /// Slug of the "view all" listing page, if the section has one
    pub view_all_slug: Option<&'static str>,
    pub forced_flags: Flags,
}

const NO_FLAGS: Flags = Flags {
    promoted: false,
    is_premium: false,
    most_viewed: false,
    most_liked: false,
};

static FEATURED: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Featured,
    api_type: "featured_properties_section",
    title_key: "featuredProperties",
    layout: SectionLayout::PropertyCarousel,
    view_all_slug: Some("featured-properties"),
    forced_flags: Flags {
        promoted: true,
        ..NO_FLAGS
    },
};

static PREMIUM: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Premium,
    api_type: "premium_properties_section",
    title_key: "premiumProperties",
    layout: SectionLayout::PropertyCarousel,
    view_all_slug: Some("premium-properties"),
    forced_flags: Flags {
        is_premium: true,
        ..NO_FLAGS
    },
};

static MOST_VIEWED: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::MostViewed,
    api_type: "most_viewed_properties_section",
    title_key: "mostViewedProperties",
    layout: SectionLayout::PropertyGrid,
    view_all_slug: Some("most-viewed-properties"),
    forced_flags: Flags {
        most_viewed: true,
        ..NO_FLAGS
    },
};

static MOST_LIKED: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::MostLiked,
    api_type: "most_liked_properties_section",
    title_key: "mostFavouriteProperties",
    layout: SectionLayout::PropertyGrid,
    view_all_slug: Some("most-favourite-properties"),
    forced_flags: Flags {
        most_liked: true,
        ..NO_FLAGS
    },
};

static NEARBY: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Nearby,
    api_type: "nearby_properties_section",
    title_key: "propertiesNearbyCity",
    layout: SectionLayout::PropertyCarousel,
    view_all_slug: Some("properties-nearby-city"),
    forced_flags: NO_FLAGS,
};

static BY_CITIES: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::ByCities,
    api_type: "properties_by_cities_section",
    title_key: "propertiesByCities",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static ON_MAP: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::OnMap,
    api_type: "properties_on_map_section",
    title_key: "propertiesOnMap",
    layout: SectionLayout::Map,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static USER_RECOMMENDATIONS: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::UserRecommendations,
    api_type: "user_recommendations_section",
    title_key: "userRecommendations",
    layout: SectionLayout::PropertyCarousel,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static FEATURED_PROJECTS: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::FeaturedProjects,
    api_type: "featured_projects_section",
    title_key: "featuredProjects",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static PROJECTS: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Projects,
    api_type: "projects_section",
    title_key: "projects",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static CATEGORIES: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Categories,
    api_type: "categories_section",
    title_key: "categories",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static AGENTS: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Agents,
    api_type: "agents_list_section",
    title_key: "agents",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static ARTICLES: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Articles,
    api_type: "articles_section",
    title_key: "articles",
    layout: SectionLayout::CardStrip,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

static FAQS: SectionDescriptor = SectionDescriptor {
    kind: SectionKind::Faqs,
    api_type: "faqs_section",
    title_key: "faqs",
    layout: SectionLayout::Accordion,
    view_all_slug: None,
    forced_flags: NO_FLAGS,
};

impl SectionKind {
    pub const ALL: [SectionKind; 14] = [
        SectionKind::Featured,
        SectionKind::Premium,
        SectionKind::MostViewed,
        SectionKind::MostLiked,
        SectionKind::Nearby,
        SectionKind::ByCities,
        SectionKind::OnMap,
        SectionKind::UserRecommendations,
        SectionKind::FeaturedProjects,
        SectionKind::Projects,
        SectionKind::Categories,
        SectionKind::Agents,
        SectionKind::Articles,
        SectionKind::Faqs,
    ];

    /// Parses the API's section `type` string. Unknown types yield `None`.
    pub fn from_api_type(section_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.descriptor().api_type == section_type)
    }

    pub fn from_view_all_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.descriptor().view_all_slug == Some(slug))
    }

    pub fn descriptor(self) -> &'static SectionDescriptor {
        match self {
            SectionKind::Featured => &FEATURED,
            SectionKind::Premium => &PREMIUM,
            SectionKind::MostViewed => &MOST_VIEWED,
            SectionKind::MostLiked => &MOST_LIKED,
            SectionKind::Nearby => &NEARBY,
            SectionKind::ByCities => &BY_CITIES,
            SectionKind::OnMap => &ON_MAP,
            SectionKind::UserRecommendations => &USER_RECOMMENDATIONS,
            SectionKind::FeaturedProjects => &FEATURED_PROJECTS,
            SectionKind::Projects => &PROJECTS,
            SectionKind::Categories => &CATEGORIES,
            SectionKind::Agents => &AGENTS,
            SectionKind::Articles => &ARTICLES,
            SectionKind::Faqs => &FAQS,
        }
    }
}

/// Resolves a home-feed's section types, skipping ones this client doesn't know
pub fn resolve_sections<'a, I>(types: I) -> Vec<&'static SectionDescriptor>
where
    I: IntoIterator<Item = &'a str>,
{
    types
        .into_iter()
        .filter_map(|section_type| {
            let kind = SectionKind::from_api_type(section_type);
            if kind.is_none() {
                tracing::debug!(section_type, "skipping unknown home section");
            }
            kind
        })
        .map(SectionKind::descriptor)
        .collect()
}

/// The page a listing search runs on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingScope {
    #[default]
    All,
    Category { slug: String },
    City { slug: String },
    Section(SectionKind),
}

impl ListingScope {
    /// Scope for a view-all page slug
    pub fn view_all(slug: &str) -> Option<Self> {
        SectionKind::from_view_all_slug(slug).map(ListingScope::Section)
    }

    /// Flags the page turns on and the user cannot switch off
    pub fn forced_flags(&self) -> Flags {
        match self {
            ListingScope::Section(kind) => kind.descriptor().forced_flags,
            _ => NO_FLAGS,
        }
    }

    pub fn city_slug(&self) -> Option<&str> {
        match self {
            ListingScope::City { slug } => Some(slug),
            _ => None,
        }
    }

    pub fn category_slug(&self) -> Option<&str> {
        match self {
            ListingScope::Category { slug } => Some(slug),
            _ => None,
        }
    }

    /// Pins the scope's values onto a filter
    pub fn apply(&self, mut filter: SearchFilter) -> SearchFilter {
        filter.flags = filter.flags.with(self.forced_flags());
        if let Some(slug) = self.city_slug() {
            filter.location.city = Some(slug.to_string());
        }
        filter
    }

    /// Removes what [`apply`](Self::apply) pins, leaving only user choices
    pub fn strip(&self, mut filter: SearchFilter) -> SearchFilter {
        let forced = self.forced_flags();
        filter.flags.promoted &= !forced.promoted;
        filter.flags.is_premium &= !forced.is_premium;
        filter.flags.most_viewed &= !forced.most_viewed;
        filter.flags.most_liked &= !forced.most_liked;
        if let (Some(slug), Some(city)) = (self.city_slug(), &filter.location.city) {
            if slug.eq_ignore_ascii_case(city) {
                filter.location.city = None;
            }
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_round_trip_their_keys() {
        for kind in SectionKind::ALL {
            let descriptor = kind.descriptor();
            assert_eq!(descriptor.kind, kind);
            assert_eq!(SectionKind::from_api_type(descriptor.api_type), Some(kind));
            if let Some(slug) = descriptor.view_all_slug {
                assert_eq!(SectionKind::from_view_all_slug(slug), Some(kind));
            }
        }
    }

    #[test]
    fn test_view_all_pages_force_their_own_flag() {
        let forced = |kind: SectionKind| kind.descriptor().forced_flags;
        let promoted = Flags {
            promoted: true,
            ..Flags::default()
        };
        let premium = Flags {
            is_premium: true,
            ..Flags::default()
        };
        assert_eq!(forced(SectionKind::Featured), promoted);
        assert_eq!(forced(SectionKind::Premium), premium);
        assert!(!forced(SectionKind::Nearby).any());
        assert!(!forced(SectionKind::Faqs).any());
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let sections = resolve_sections([
            "faqs_section",
            "sponsored_banner_section",
            "most_viewed_properties_section",
        ]);
        let kinds: Vec<_> = sections.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Faqs, SectionKind::MostViewed]);
    }

    #[test]
    fn test_most_viewed_page_forces_its_flag_only() {
        let scope = ListingScope::view_all("most-viewed-properties").unwrap();
        let mut filter = SearchFilter::default();
        filter.flags.promoted = true;

        let applied = scope.apply(filter);
        assert!(applied.flags.most_viewed);
        assert!(applied.flags.promoted);
        assert!(!applied.flags.most_liked);

        // The user cannot turn the page's flag off.
        let mut toggled = applied.clone();
        toggled.flags.most_viewed = false;
        assert!(scope.apply(toggled).flags.most_viewed);
    }

    #[test]
    fn test_strip_undoes_apply() {
        let scope = ListingScope::City {
            slug: "bhuj".to_string(),
        };
        let mut filter = SearchFilter::default();
        filter.keywords = "farm".to_string();

        let applied = scope.apply(filter.clone());
        assert_eq!(scope.strip(applied), filter);
    }

    #[test]
    fn test_unknown_view_all_slug() {
        assert_eq!(ListingScope::view_all("cheapest-properties"), None);
    }
}
