use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html::push_html};
use serde_json::json;

use crate::{
    dates,
    models::{Movie, MovieCard, MoviePage, SortField},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const SITE_NAME: &str = "Slow Cinema Club";

/// Sort options offered on the reviews index, in display order.
pub const INDEX_SORTS: [(SortField, &str); 5] = [
    (SortField::UpdatedAt, "Recently added"),
    (SortField::Title, "Title"),
    (SortField::Year, "Year"),
    (SortField::Duration, "Length"),
    (SortField::Rating, "Rating"),
];

pub fn home_page(latest: &[MovieCard], featured: &[MovieCard]) -> String {
    page(
        SITE_NAME,
        html! {},
        html! {
            section class="max-w-5xl mx-auto px-6 py-12" {
                h1 class="text-4xl font-bold text-gray-900" { (SITE_NAME) }
                p class="mt-2 text-gray-600" { "Deep analysis of arthouse and experimental cinema." }

                h2 class="mt-12 text-2xl font-semibold text-gray-900" { "Latest reviews" }
                @if latest.is_empty() {
                    p class="mt-4 text-gray-500" { "No reviews yet." }
                } @else {
                    div class="mt-6 grid gap-6 md:grid-cols-3" {
                        @for movie in latest {
                            (movie_card(movie))
                        }
                    }
                }

                @if !featured.is_empty() {
                    h2 class="mt-12 text-2xl font-semibold text-gray-900" { "Featured this week" }
                    div class="mt-6 grid gap-6 md:grid-cols-2" {
                        @for movie in featured {
                            (movie_card(movie))
                        }
                    }
                }

                a class="mt-12 inline-block text-blue-600 hover:text-blue-800" href="/reviews" { "All reviews" }
            }
        },
    )
}

pub fn reviews_index(listing: &MoviePage, sort: SortField, page_no: u64) -> String {
    let pagination = &listing.pagination;
    let page_link =
        |n: u64| format!("/reviews?sort={}&page={n}", urlencoding::encode(sort.as_str()));

    page(
        &format!("Reviews | {SITE_NAME}"),
        html! {},
        html! {
            section class="max-w-5xl mx-auto px-6 py-12" {
                div class="flex items-end justify-between gap-6" {
                    div {
                        h1 class="text-3xl font-bold text-gray-900" { "Reviews" }
                        p class="mt-2 text-gray-600" { (pagination.total) " films" }
                    }
                    nav class="flex gap-3 text-sm" {
                        @for (field, label) in INDEX_SORTS {
                            @if field == sort {
                                span class="font-semibold text-gray-900" { (label) }
                            } @else {
                                a class="text-blue-600 hover:text-blue-800" href=(format!("/reviews?sort={}", urlencoding::encode(field.as_str()))) { (label) }
                            }
                        }
                    }
                }

                @if listing.movies.is_empty() {
                    p class="mt-10 text-gray-500" { "Nothing here yet." }
                } @else {
                    div class="mt-10 grid gap-6 md:grid-cols-3" {
                        @for movie in &listing.movies {
                            (movie_card(movie))
                        }
                    }
                }

                div class="mt-10 flex justify-between text-sm" {
                    @if page_no > 1 {
                        a class="text-blue-600 hover:text-blue-800" href=(page_link(page_no - 1)) { "Previous" }
                    } @else {
                        span {}
                    }
                    @if pagination.has_more {
                        a class="text-blue-600 hover:text-blue-800" href=(page_link(page_no + 1)) { "Next" }
                    }
                }
            }
        },
    )
}

pub fn review_page(movie: &Movie, site_url: &str) -> String {
    let canonical = format!("{site_url}/reviews/{}", movie.slug);
    let heading = match movie.year {
        Some(year) => format!("{} ({year})", movie.title),
        None => movie.title.clone(),
    };
    let published = dates::or_now(movie.updated_at.as_deref(), jiff::Timestamp::now());

    let head = html! {
        link rel="canonical" href=(canonical);
        meta name="description" content=(truncate(&movie.description, 160));
        meta property="og:title" content=(format!("{heading} - Film Review | {SITE_NAME}"));
        meta property="og:url" content=(canonical);
        meta property="og:type" content="article";
        meta property="og:site_name" content=(SITE_NAME);
        @if !movie.image_url.is_empty() {
            meta property="og:image" content=(movie.image_url);
        }
        script type="application/ld+json" { (PreEscaped(structured_data(movie, site_url, published))) }
    };

    page(
        &format!("{heading} - Film Review | {SITE_NAME}"),
        head,
        html! {
            article class="max-w-3xl mx-auto px-6 py-12" {
                nav class="text-sm text-gray-500" {
                    a class="hover:text-gray-700" href="/" { "Home" }
                    " / "
                    a class="hover:text-gray-700" href="/reviews" { "Reviews" }
                }

                header class="mt-6" {
                    @if !movie.image_url.is_empty() {
                        img class="w-full aspect-[2/1] object-cover rounded-xl brightness-75" src=(movie.image_url) alt=(format!("Still from {heading}"));
                    }
                    h1 class="mt-8 text-4xl font-bold text-gray-900" { (heading) }
                    @if !movie.director.is_empty() {
                        p class="mt-2 text-lg text-gray-600" { "Directed by " (movie.director) }
                    }
                    @if movie.rating > 0.0 && movie.vote_count > 0 {
                        p class="mt-2 text-sm text-gray-500" {
                            span class="font-semibold text-gray-900" { (format!("{:.1}", movie.rating)) }
                            " / 10 from " (movie.vote_count) " votes"
                        }
                    }
                }

                div class="mt-10 prose prose-lg max-w-none" {
                    (PreEscaped(markdown(&movie.description)))
                }

                dl class="mt-12 grid grid-cols-2 gap-4 text-sm" {
                    @if let Some(year) = movie.year {
                        dt class="text-gray-500" { "Year" }
                        dd class="text-gray-900" { (year) }
                    }
                    @if let Some(duration) = movie.duration {
                        dt class="text-gray-500" { "Length" }
                        dd class="text-gray-900" { (duration) " minutes" }
                    }
                    @if !movie.language_name.is_empty() {
                        dt class="text-gray-500" { "Language" }
                        dd class="text-gray-900" { (movie.language_name) }
                    }
                    dt class="text-gray-500" { "Reviewed" }
                    dd class="text-gray-900" { (dates::long_date(published)) }
                }

                @if !movie.cast.is_empty() {
                    h2 class="mt-12 text-xl font-semibold text-gray-900" { "Cast" }
                    ul class="mt-4 space-y-1 text-gray-700" {
                        @for actor in &movie.cast {
                            li { (actor) }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {},
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

pub fn not_found_page() -> String {
    page(
        "Not found",
        html! {},
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Review not found" }
                        p class="mt-4 text-gray-700" { "We could not find the film you were looking for." }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/reviews" { "Browse all reviews" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, head: Markup, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="alternate" type="application/rss+xml" title=(SITE_NAME) href="/feed.xml";
                script src=(TAILWIND_CDN) {}
                (head)
            }
            body class="bg-gray-50" { (body) }
        }
    }
    .into_string()
}

fn movie_card(movie: &MovieCard) -> Markup {
    html! {
        a class="block bg-white shadow rounded-lg overflow-hidden hover:shadow-md" href=(format!("/reviews/{}", movie.slug)) {
            @if !movie.image_preview_url.is_empty() {
                img class="w-full aspect-video object-cover" src=(movie.image_preview_url) alt=(movie.title) loading="lazy";
            }
            div class="p-4" {
                h3 class="font-semibold text-gray-900" {
                    (movie.title)
                    @if let Some(year) = movie.year {
                        span class="ml-2 font-normal text-gray-500" { "(" (year) ")" }
                    }
                }
                @if !movie.director.is_empty() {
                    p class="mt-1 text-sm text-gray-600" { (movie.director) }
                }
                p class="mt-1 text-xs text-gray-500" { (movie.language_name()) }
            }
        }
    }
}

fn markdown(source: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_FOOTNOTES);

    let mut out = String::new();
    push_html(&mut out, Parser::new_ext(source, opts));
    out
}

/// schema.org `Review` markup, safe to embed in a `<script>` element.
fn structured_data(movie: &Movie, site_url: &str, published: jiff::Timestamp) -> String {
    let organization = json!({ "@type": "Organization", "name": SITE_NAME, "url": site_url });
    let actors: Vec<_> =
        movie.cast.iter().map(|name| json!({ "@type": "Person", "name": name })).collect();

    let mut data = json!({
        "@context": "https://schema.org",
        "@type": "Review",
        "name": format!("{} - Film Review", movie.title),
        "reviewBody": truncate(&movie.description, 500),
        "datePublished": published.to_string(),
        "author": organization.clone(),
        "publisher": organization,
        "itemReviewed": {
            "@type": "Movie",
            "name": movie.title,
            "image": movie.image_url,
            "director": { "@type": "Person", "name": movie.director },
            "actor": actors,
            "datePublished": movie.year,
            "inLanguage": movie.language_name,
            "description": truncate(&movie.description, 200),
            "url": format!("{site_url}/reviews/{}", movie.slug),
        },
    });
    if let Some(duration) = movie.duration {
        data["itemReviewed"]["duration"] = json!(format!("PT{duration}M"));
    }
    if movie.rating > 0.0 && movie.vote_count > 0 {
        data["reviewRating"] = json!({
            "@type": "Rating",
            "ratingValue": movie.rating,
            "bestRating": "10",
            "worstRating": "1",
            "ratingCount": movie.vote_count,
        });
    }

    data.to_string().replace("</", "<\\/")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
