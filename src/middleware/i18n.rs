//! Locale and translation context.

use std::sync::Arc;

use crate::context::{Context, Key};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// A locale-bound translation function: message key in, localized text out.
pub type TranslateFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The locale-negotiation capability [`I18n`] composes with. How a locale
/// is chosen (accept-language, query, cookie) and where translations come
/// from are entirely its business.
pub trait LocaleResolver: Send + Sync + 'static {
    /// The locale for this request, e.g. `"en"` or `"fr-CA"`.
    fn resolve(&self, request: &Request) -> impl Future<Output = String> + Send;

    /// A translation function bound to `locale`, optionally narrowed to a
    /// namespace.
    fn fixed_t(
        &self,
        locale: &str,
        namespace: Option<&str>,
    ) -> impl Future<Output = TranslateFn> + Send;
}

/// Resolves the request locale and a translator once per request and parks
/// resolver, locale and translator in the context for downstream retrieval.
///
/// Keys are per-instance, same scheme as the session layer.
pub struct I18n<R> {
    resolver: Arc<R>,
    resolver_key: Key<Arc<R>>,
    locale_key: Key<String>,
    translator_key: Key<TranslateFn>,
}

impl<R: LocaleResolver> I18n<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver: Arc::new(resolver),
            resolver_key: Key::new(),
            locale_key: Key::new(),
            translator_key: Key::new(),
        }
    }

    pub fn resolver_key(&self) -> Key<Arc<R>> {
        self.resolver_key
    }

    pub fn locale_key(&self) -> Key<String> {
        self.locale_key
    }

    pub fn translator_key(&self) -> Key<TranslateFn> {
        self.translator_key
    }
}

impl<R: LocaleResolver> Middleware for I18n<R> {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let locale = self.resolver.resolve(ctx.request()).await;
            let translator = self.resolver.fixed_t(&locale, None).await;

            ctx.set(self.resolver_key, Arc::clone(&self.resolver));
            ctx.set(self.locale_key, locale);
            ctx.set(self.translator_key, translator);

            next.run(ctx).await
        })
    }
}

// ── Accessors ────────────────────────────────────────────────────────────────
//
// All of these fail with `Error::MiddlewareMissing` when the middleware has
// not run upstream of the call site.

/// The locale resolved for this request.
pub fn get_locale(ctx: &Context, key: Key<String>) -> Result<String, Error> {
    ctx.require(key, "i18n")
}

/// The default translator for this request's locale.
pub fn get_translator(ctx: &Context, key: Key<TranslateFn>) -> Result<TranslateFn, Error> {
    ctx.require(key, "i18n")
}

/// The resolver instance itself.
pub fn get_resolver<R: LocaleResolver>(ctx: &Context, key: Key<Arc<R>>) -> Result<Arc<R>, Error> {
    ctx.require(key, "i18n")
}

/// A translator narrowed to `namespace`, re-derived from the stored
/// resolver and locale.
pub async fn get_namespace_translator<R: LocaleResolver>(
    ctx: &Context,
    resolver_key: Key<Arc<R>>,
    locale_key: Key<String>,
    namespace: &str,
) -> Result<TranslateFn, Error> {
    let resolver = get_resolver(ctx, resolver_key)?;
    let locale = get_locale(ctx, locale_key)?;
    Ok(resolver.fixed_t(&locale, Some(namespace)).await)
}
