use leanvm_core::{AppConfig, ImageConfig, Profile};

/// Binaries copied from the builder into the runtime stage.
const RUNTIME_BINARIES: &[&str] = &["erl", "erlc", "elixir", "elixirc", "iex", "mix"];

/// Generates the multi-stage Alpine Dockerfile for a profile.
pub struct DockerfileGenerator<'a> {
    images: &'a ImageConfig,
    app: &'a AppConfig,
    profile: Profile,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(images: &'a ImageConfig, app: &'a AppConfig, profile: Profile) -> Self {
        Self {
            images,
            app,
            profile,
        }
    }

    pub fn render(&self) -> String {
        let heading = match self.profile {
            Profile::Runtime => "# Multi-stage build for minimal Elixir VM".to_owned(),
            Profile::App => format!(
                "# Multi-stage build for minimal Elixir VM with {} app",
                self.app.name
            ),
        };

        let copy_binaries: String = RUNTIME_BINARIES
            .iter()
            .map(|bin| format!("COPY --from=builder /usr/local/bin/{bin} /usr/local/bin/\n"))
            .collect();

        format!(
            r#"
{heading}
# Stage 1: Builder
FROM {builder} AS builder

# Install build dependencies
RUN apk add --no-cache {build_packages}

WORKDIR /app

# Install hex and rebar
RUN mix local.hex --force && \
    mix local.rebar --force
{release}
# Stage 2: Runtime
FROM {runtime} AS runtime

# Install runtime dependencies
RUN apk add --no-cache {runtime_packages}

# Create non-root user
RUN addgroup -g 1000 elixir && \
    adduser -u 1000 -G elixir -s /bin/sh -D elixir

WORKDIR /app

# Copy Erlang/Elixir runtime from builder
COPY --from=builder /usr/local/lib/erlang /usr/local/lib/erlang
COPY --from=builder /usr/local/lib/elixir /usr/local/lib/elixir
{copy_binaries}{runtime_tail}
# Stage 3: VM Export (using scratch for minimal size)
FROM scratch AS export
COPY --from=runtime / /
"#,
            builder = self.images.builder_image,
            build_packages = self.images.build_packages.join(" "),
            release = self.release_steps(),
            runtime = self.images.runtime_image,
            runtime_packages = self.images.runtime_packages.join(" "),
            runtime_tail = self.runtime_tail(),
        )
    }

    /// Builder-stage steps that compile the Mix release (`app` only).
    fn release_steps(&self) -> String {
        match self.profile {
            Profile::Runtime => String::new(),
            Profile::App => format!(
                r#"
# Copy {name} application
COPY {source} .

# Get dependencies and compile
ENV MIX_ENV=prod
RUN mix deps.get
RUN mix compile
RUN mix release
"#,
                name = self.app.name,
                source = self.app.source_dir.display(),
            ),
        }
    }

    fn runtime_tail(&self) -> String {
        match self.profile {
            Profile::Runtime => r#"
USER elixir

# Set up environment
ENV LANG=C.UTF-8
ENV ERL_AFLAGS="-kernel shell_history enabled"
ENV PATH="/usr/local/bin:$PATH"
ENV ERL_LIBS="/usr/local/lib/elixir/lib"

CMD ["iex"]
"#
            .to_owned(),
            Profile::App => format!(
                r#"
# Copy application release
COPY --from=builder /app/_build/prod/rel/{name} ./

# Set up environment
ENV LANG=C.UTF-8
ENV PATH="/usr/local/bin:$PATH"
ENV ERL_LIBS="/usr/local/lib/elixir/lib"
ENV ERL_AFLAGS="-kernel shell_history enabled"

# Fix permissions
USER root
RUN chmod +x /usr/local/bin/* && \
    chown -R elixir:elixir /usr/local/lib/elixir && \
    chown -R elixir:elixir /usr/local/lib/erlang && \
    chown -R elixir:elixir /app
USER elixir

# Start the application
CMD ["./bin/{name}", "start"]
"#,
                name = self.app.name,
            ),
        }
    }
}
