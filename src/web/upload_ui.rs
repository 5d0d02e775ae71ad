use crate::web::templates::escape_html;

pub const UPLOAD_WIDGET_STYLES: &str = r#"
.upload-widget { display: flex; flex-direction: column; gap: 0.75rem; margin-bottom: 1.5rem; }
.upload-widget__label { font-weight: 600; color: #0f172a; }
.upload-widget__description { color: #475569; font-size: 0.95rem; margin: 0; }
.upload-dropzone { border: 2px dashed #cbd5f5; border-radius: 12px; padding: 2rem; text-align: center; background: #f8fafc; color: #475569; transition: border-color 0.2s ease, background 0.2s ease; cursor: pointer; }
.upload-dropzone strong { color: #1d4ed8; }
.upload-dropzone[data-state="dragover"] { border-color: #2563eb; background: #e0f2fe; }
.upload-browse { color: #2563eb; text-decoration: underline; cursor: pointer; }
.upload-input { display: none; }
.upload-selected { min-height: 1.5rem; font-size: 0.95rem; color: #2563eb; word-break: break-all; }
@media (max-width: 768px) {
    .upload-dropzone { padding: 1.5rem 1rem; }
}
"#;

/// Drag-and-drop behaviour for every `.upload-widget` on the page.
pub const UPLOAD_WIDGET_SCRIPT: &str = r#"<script>
(function() {
    function initWidget(widget) {
        if (widget.dataset.initialized === 'true') {
            return;
        }
        widget.dataset.initialized = 'true';

        const input = widget.querySelector('input[type="file"]');
        const dropzone = widget.querySelector('[data-dropzone]');
        const selected = widget.querySelector('[data-upload-selected]');
        if (!input || !dropzone) {
            return;
        }

        function renderSelection() {
            if (!selected) {
                return;
            }
            selected.textContent = input.files.length > 0 ? `Selected: ${input.files[0].name}` : '';
        }

        function takeFirst(files) {
            if (files.length === 0) {
                return;
            }
            const dt = new DataTransfer();
            dt.items.add(files[0]);
            input.files = dt.files;
            input.dispatchEvent(new Event('change'));
        }

        input.addEventListener('change', renderSelection);
        dropzone.addEventListener('click', () => input.click());
        dropzone.addEventListener('dragenter', (event) => {
            event.preventDefault();
            dropzone.dataset.state = 'dragover';
        });
        dropzone.addEventListener('dragover', (event) => event.preventDefault());
        dropzone.addEventListener('dragleave', (event) => {
            event.preventDefault();
            if (!dropzone.contains(event.relatedTarget)) {
                delete dropzone.dataset.state;
            }
        });
        dropzone.addEventListener('drop', (event) => {
            event.preventDefault();
            delete dropzone.dataset.state;
            takeFirst(event.dataTransfer.files);
        });

        renderSelection();
    }

    if (document.readyState === 'loading') {
        document.addEventListener('DOMContentLoaded', () => {
            document.querySelectorAll('.upload-widget').forEach(initWidget);
        });
    } else {
        document.querySelectorAll('.upload-widget').forEach(initWidget);
    }
})();
</script>"#;

#[derive(Debug, Clone)]
pub struct UploadWidgetConfig<'a> {
    pub widget_id: &'a str,
    pub input_id: &'a str,
    pub field_name: &'a str,
    pub label: &'a str,
    pub description: Option<&'a str>,
    pub accept: Option<&'a str>,
}

impl<'a> UploadWidgetConfig<'a> {
    pub fn new(widget_id: &'a str, input_id: &'a str, field_name: &'a str, label: &'a str) -> Self {
        Self {
            widget_id,
            input_id,
            field_name,
            label,
            description: None,
            accept: None,
        }
    }

    pub fn with_description(mut self, text: &'a str) -> Self {
        self.description = Some(text);
        self
    }

    pub fn with_accept(mut self, accept: &'a str) -> Self {
        self.accept = Some(accept);
        self
    }
}

pub fn render_upload_widget(config: &UploadWidgetConfig<'_>) -> String {
    let description = config
        .description
        .map(|text| {
            format!(
                "<p class=\"upload-widget__description\">{}</p>",
                escape_html(text)
            )
        })
        .unwrap_or_default();

    let accept_attr = config
        .accept
        .map(|value| format!(" accept=\"{}\"", escape_html(value)))
        .unwrap_or_default();

    format!(
        r#"<div class="upload-widget" id="{id}">
    <label class="upload-widget__label" for="{input_id}">{label}</label>
    {description}
    <div class="upload-dropzone" data-dropzone>
        <p><strong>Drag and drop a file</strong> here, or <span class="upload-browse">browse</span></p>
        <input class="upload-input" id="{input_id}" name="{field_name}" type="file"{accept_attr}>
    </div>
    <div class="upload-selected" data-upload-selected></div>
</div>"#,
        id = escape_html(config.widget_id),
        input_id = escape_html(config.input_id),
        label = escape_html(config.label),
        field_name = escape_html(config.field_name),
    )
}
