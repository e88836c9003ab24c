//! In-page click handling for the drawn graph.
//!
//! Links marked with `data-refocus` are intercepted: the neighborhood
//! fragment is fetched from `/view/graph/<id>/` and swapped into the
//! container, and nodes that survive the swap are animated from their old
//! positions. Links without the marker (the focus node) navigate normally.
//! Requests name the page view from the container's `data-view`, and adopt
//! whatever view the server answers with.

pub fn render_click_js(container_selector: &str) -> String {
    format!(
        r##"<script>
        (function() {{
            const container = document.querySelector('{container_sel}');
            if (!container) return;
            let inFlight = null;

            function snapshot() {{
                const nodes = {{}};
                container.querySelectorAll('g.node[data-node]').forEach(function(el) {{
                    nodes[el.dataset.node] = el.style.transform;
                }});
                const svg = container.querySelector('svg');
                const output = container.querySelector('g.output');
                return {{
                    nodes: nodes,
                    height: svg ? svg.getAttribute('height') : null,
                    offset: output ? output.style.transform : null
                }};
            }}

            // Put an element back where it was, then let its CSS transition
            // carry it to the new value.
            function animateFrom(el, apply, restore) {{
                const transition = el.style.transition;
                el.style.transition = 'none';
                apply();
                el.getBoundingClientRect();
                el.style.transition = transition;
                restore();
            }}

            function swap(html) {{
                const before = snapshot();
                container.innerHTML = html;

                container.querySelectorAll('g.node[data-node]').forEach(function(el) {{
                    const previous = before.nodes[el.dataset.node];
                    if (!previous) return;
                    const target = el.style.transform;
                    animateFrom(el, () => el.style.transform = previous, () => el.style.transform = target);
                }});

                const svg = container.querySelector('svg');
                if (svg && before.height) {{
                    const target = svg.getAttribute('height');
                    animateFrom(svg, () => svg.setAttribute('height', before.height), () => svg.setAttribute('height', target));
                }}
                const output = container.querySelector('g.output');
                if (output && before.offset) {{
                    const target = output.style.transform;
                    animateFrom(output, () => output.style.transform = before.offset, () => output.style.transform = target);
                }}
            }}

            container.addEventListener('click', function(event) {{
                const link = event.target.closest('a[data-refocus]');
                if (!link) return;
                event.preventDefault();

                if (inFlight) inFlight.abort();
                const controller = new AbortController();
                inFlight = controller;

                fetch('/view/graph/' + link.dataset.refocus + '/', {{
                    headers: {{
                        'X-Requested-With': 'XMLHttpRequest',
                        'X-Graph-View': container.dataset.view || ''
                    }},
                    signal: controller.signal
                }}).then(r => {{
                    const view = r.headers.get('X-Graph-View');
                    if (view) container.dataset.view = view;
                    return r.status === 204 ? null : r.text();
                }})
                  .then(html => {{
                      if (html !== null && inFlight === controller) swap(html);
                  }})
                  .catch(e => {{
                      if (e.name === 'AbortError') return;
                      container.innerHTML = '<p>Oops. An error occurred while trying to request ' +
                          'the tune graph (\'0 ' + e.message + '\'). Try starting over with a new ' +
                          '<a href="/search/">search</a>.</p>';
                  }});
            }});
        }})();
        </script>"##,
        container_sel = container_selector,
    )
}
